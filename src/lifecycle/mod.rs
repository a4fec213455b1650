pub mod bulk;
pub mod controller;
pub mod expiry;
pub mod notice;
pub mod selection;
pub mod undo;

pub use bulk::*;
pub use controller::*;
pub use expiry::*;
pub use notice::*;
pub use selection::*;
pub use undo::*;

use std::rc::Rc;

use crate::utils::{Clock, SystemClock};

/// Collaborators shared by every view of one session: the clock, the single
/// notice area and the undo slot living in it
#[derive(Clone)]
pub struct ViewContext {
    pub clock: Rc<dyn Clock>,
    pub snackbar: Rc<Snackbar>,
    pub undo: Rc<UndoCoordinator>,
}

impl ViewContext {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        let snackbar = Rc::new(Snackbar::new(clock.clone()));
        let undo = Rc::new(UndoCoordinator::new(snackbar.clone()));
        Self { clock, snackbar, undo }
    }

    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock))
    }
}
