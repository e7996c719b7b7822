pub mod domain;
pub mod ports;

pub use domain::{
    AccessLevel, CallerIdentity, Comment, Creator, Lesson, Report, ReportStatus, Role, RoleSet,
    User,
};
pub use ports::{
    LessonStore, PaymentGateway, PortError, PortResult, ReportStore, TokenVerifier, UserStore,
};
