/// GPU interface module — the narrow trait surface the render core draws
/// through.
///
/// The render core never talks to a graphics API directly. Backends implement
/// these traits; the crate ships a software mock implementation
/// ([`MockGraphicsDevice`]) used by the test suite and for headless runs.

pub mod device;
pub mod command_list;
pub mod mock_device;

pub use device::*;
pub use command_list::*;
pub use mock_device::{MockGraphicsDevice, MockCommandList};
