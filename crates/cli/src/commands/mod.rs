pub mod medications;
pub mod report;
pub mod util;
pub mod workspace;

pub use medications::*;
pub use report::*;
pub use util::*;
pub use workspace::*;
