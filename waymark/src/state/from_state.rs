use crate::state::{State, StateData};

/// Reads a value of the implementing type out of `State`, as in
/// `HeaderMap::try_borrow_from(&state)`.
pub trait FromState: StateData + Sized {
    /// Borrows the value, if one is stored.
    fn try_borrow_from(state: &State) -> Option<&Self>;

    /// Borrows the value.
    ///
    /// # Panics
    ///
    /// If no value of this type is stored.
    fn borrow_from(state: &State) -> &Self;
}

impl<T: StateData> FromState for T {
    fn try_borrow_from(state: &State) -> Option<&Self> {
        state.try_borrow()
    }

    fn borrow_from(state: &State) -> &Self {
        state.borrow()
    }
}
