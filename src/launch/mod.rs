// 应用启动模块 - 框架检测、进程组管理与启动状态机

pub mod framework;
pub mod launcher;
pub mod process;

pub use framework::detect_framework;
pub use launcher::{AppLauncher, LaunchState};
pub use process::{ProcessGroup, SystemProcess};
