pub mod agent;
pub mod click;
pub mod conversion;
pub mod session;

pub use agent::Entity as AgentEntity;
pub use click::Entity as ClickEntity;
pub use conversion::Entity as ConversionEntity;
pub use session::Entity as SessionEntity;
