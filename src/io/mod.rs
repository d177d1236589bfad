/// CSV timeseries export.
pub mod export;
