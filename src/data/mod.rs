pub mod converters;
pub mod csv_codec;
pub mod data_store;
pub mod datatable;
pub mod datavalue_compare;
pub mod mutations;
pub mod shape;
pub mod sorting;
