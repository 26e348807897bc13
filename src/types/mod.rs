pub mod errors;
pub mod events;
pub mod message;
pub mod session;
pub mod tool;

pub use errors::AppError;
pub use events::StreamEvent;
pub use message::{Attachment, Message, RelayRequest, Role, SendReceipt, SendRequest};
pub use session::{LayoutMode, PanelLayout, Session, SessionSummary, SLOT_COUNT};
pub use tool::{tools, Tool, ToolId, TOOLS};
