use factgate_derive::factgate_error;

#[factgate_error]
pub enum PlainError {
    #[error("section missing: {path}")]
    Missing { path: String },
}

fn main() {
    let err = PlainError::Missing { path: "os".to_owned() };
    assert_eq!(err.to_string(), "section missing: os");
}
