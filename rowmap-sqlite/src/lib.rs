mod bind;
mod cbox;
mod connection;
mod driver;
mod extract;
mod sql_writer;

use std::{
    ffi::{CStr, c_char},
    ptr,
};

pub(crate) use bind::*;
pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;
pub(crate) use extract::*;
pub use sql_writer::*;

pub(crate) fn error_message_from_ptr(ptr: &'_ *const c_char) -> &'_ str {
    unsafe {
        if *ptr != ptr::null() {
            CStr::from_ptr(*ptr)
                .to_str()
                .unwrap_or("Unknown error (the error message was not a valid C string)")
        } else {
            "Unknown error (could not extract the error message)"
        }
    }
}
