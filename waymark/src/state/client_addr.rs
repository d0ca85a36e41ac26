//! The remote address of the connection a request arrived on.

use std::net::SocketAddr;

use crate::state::{FromState, State, StateData};

struct ClientAddr(SocketAddr);

impl StateData for ClientAddr {}

pub(crate) fn put_client_addr(state: &mut State, addr: SocketAddr) {
    state.put(ClientAddr(addr))
}

/// The address of the connected client, when the connection reported one.
pub fn client_addr(state: &State) -> Option<SocketAddr> {
    ClientAddr::try_borrow_from(state).map(|c| c.0)
}
