use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Row ({asset}, {date}) carries {got} feature values but the dataset declares {expected}.")]
    FeatureCountMismatch {
        asset: String,
        date: String,
        expected: usize,
        got: usize,
    },
}
