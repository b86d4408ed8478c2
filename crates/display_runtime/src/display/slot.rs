use crate::plugin::Uid;
use crate::timer::Timer;

/// One addressable display region
///
/// The slot's index is its position in the slot table, so moving a plugin
/// between slots swaps whole `Slot` values and the rotation timer travels
/// with its occupant.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    occupant: Option<Uid>,
    timer: Timer,
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uid of the installed plugin
    pub fn occupant(&self) -> Option<Uid> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub(crate) fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub(crate) fn set_occupant(&mut self, uid: Uid) {
        self.occupant = Some(uid);
        self.timer.stop();
    }

    pub(crate) fn clear(&mut self) -> Option<Uid> {
        self.timer.stop();
        self.occupant.take()
    }
}
