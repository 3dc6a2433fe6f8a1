//! Dispatch surface (C7): routes a validated local-destination frame to
//! a handler chosen by its `data_type` tag.

use crate::private::*;

/// A typed, borrowed view into an inbound frame handed to a dispatch
/// handler. Handlers must not retain `payload` past return.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxView<'t> {
    pub source_id: u8,
    pub target_id: u8,
    pub payload: &'t [u8],
}

/// Handler signature (§6.2). Plain function pointers, not boxed
/// closures: the table is a fixed array sized to `N`, matching the
/// original's function-pointer table rather than introducing heap
/// allocation.
pub type Handler = for<'t> fn(RxView<'t>) -> Result<()>;

/// Fixed-size `data_type -> handler` registration table.
pub struct Dispatch<const N: usize> {
    table: [Option<Handler>; N],
}

impl<const N: usize> Default for Dispatch<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Dispatch<N> {
    pub const fn new() -> Self {
        Self { table: [None; N] }
    }

    /// Registers `handler` for `data_type`.
    ///
    /// # Errors
    ///
    /// Returns `Inval` if `data_type >= N`, or `Repeated` if a handler
    /// is already registered for this tag.
    pub fn register(&mut self, data_type: u8, handler: Handler) -> Result<()> {
        let idx = data_type as usize;
        if idx >= N {
            return Err(Error::Inval);
        }
        if self.table[idx].is_some() {
            return Err(Error::Repeated);
        }
        self.table[idx] = Some(handler);
        Ok(())
    }

    /// Dispatches `view` to the handler registered for `data_type`.
    ///
    /// # Errors
    ///
    /// Returns `Inval` if `data_type >= N`, `NotExist` if no handler is
    /// registered, or propagates the handler's own error.
    pub fn dispatch(&self, data_type: u8, view: RxView) -> Result<()> {
        let idx = data_type as usize;
        if idx >= N {
            return Err(Error::Inval);
        }
        match self.table[idx] {
            Some(handler) => handler(view),
            None => Err(Error::NotExist),
        }
    }
}
