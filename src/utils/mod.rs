//! Utility functions and types

pub mod data_loader;

pub use data_loader::{
    array1_to_frame, array2_to_frame, column_names, frame_to_array2, load_csv, read_feature_table,
    read_target_table, save_csv,
};
