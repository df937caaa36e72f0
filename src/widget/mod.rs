pub mod popup;
pub mod sidebar;
pub mod surface;

pub use popup::{Popup, centered_rect};
pub use surface::{PageSurface, Scroll};
