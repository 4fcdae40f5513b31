mod activity;
mod alert;
mod call;
mod message;
mod number;
mod tagged;

pub use activity::{ActivityEntry, ActivityKind};
pub use alert::Alert;
pub use call::{Call, CallDetail, Recording};
pub use message::{Media, Message, MessageDetail};
pub use number::{NumberCapabilities, NumberUpdate, PhoneNumber};
pub use tagged::{Tagged, Timestamped};
