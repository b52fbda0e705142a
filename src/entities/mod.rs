pub mod calendar_import_map;
pub mod list_member;
pub mod task;
pub mod task_list;

pub use calendar_import_map::Entity as CalendarImportMap;
pub use list_member::Entity as ListMember;
pub use task::Entity as Task;
pub use task_list::Entity as TaskList;
