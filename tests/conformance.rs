mod conformance {
    pub mod common;
    mod merge;
}
