//! Fixture tasks.

use tasks_persistence::types::Task;

/// The task used throughout the end-to-end scenarios.
pub fn default_task() -> Task {
    Task::new().name_en("A").name_ar("ب").status(1).code("C1")
}

/// A fully populated task distinct from [`default_task`].
pub fn updated_task() -> Task {
    Task::new()
        .name_en("BBBBBBBBBB")
        .name_ar("ججججج")
        .status(2)
        .code("C2")
}

/// A small catalogue for search tests.
pub fn catalogue() -> Vec<Task> {
    vec![
        Task::new()
            .name_en("Stock take")
            .name_ar("جرد المخزون")
            .status(1)
            .code("INV-1"),
        Task::new()
            .name_en("Payroll run")
            .name_ar("مسير الرواتب")
            .status(2)
            .code("HR-1"),
        Task::new()
            .name_en("Stock audit")
            .name_ar("تدقيق المخزون")
            .status(2)
            .code("INV-2"),
        Task::new()
            .name_en("Fleet check")
            .name_ar("فحص الأسطول")
            .status(3)
            .code("OPS-1"),
    ]
}
