pub mod panels;
pub mod plot;
pub mod table;

use profe_score::data::aggregate::ViewKind;

/// A download requested during rendering, carried out once the frame's
/// borrows of the dashboard have ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    View(ViewKind),
    Filtered,
}
