//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods generic over any `ConnectionTrait`.

pub mod calendar_import_map;
pub mod list_member;
pub mod task;
pub mod task_list;

pub use calendar_import_map::CalendarImportMapRepository;
pub use list_member::ListMemberRepository;
pub use task::TaskRepository;
pub use task_list::TaskListRepository;
