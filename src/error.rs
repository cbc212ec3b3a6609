use crate::contacts_client;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("contacts client error: {0}")]
    ContactsClient(#[from] contacts_client::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
