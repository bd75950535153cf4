use crate::{
    errors::{map_error, set_last_error, ErrorCode},
    handle_registry::{register_handle, unregister_handle, with_handle, with_handle_mut, TreeId},
    RadixTree, TreeConfig,
};
use std::{ffi::CStr, os::raw::c_char};

/// One parameter of a `radix_tree_search` hit.
///
/// `key` points into the tree and stays valid until `radix_tree_free`;
/// the value is reported as a byte range of the caller's own path buffer.
#[repr(C)]
pub struct RadixParamT {
    pub key: *const u8,
    pub key_len: usize,
    pub value_offset: usize,
    pub value_len: usize,
}

// ─────────────────────────── helpers ─────────────────────────────────── //

#[inline]
fn cstr<'a>(p: *const c_char) -> Result<&'a str, ErrorCode> {
    if p.is_null() {
        return Err(ErrorCode::Utf8Error);
    }
    unsafe { CStr::from_ptr(p) }
        .to_str()
        .map_err(|_| ErrorCode::Utf8Error)
}

#[inline]
fn finish(code: ErrorCode) -> ErrorCode {
    set_last_error(code);
    code
}

// ─── small helper to turn Result<T,ErrorCode> into early-return ──────────
macro_rules! try_c { ($expr:expr) => { match $expr {
    Ok(v)  => v,
    Err(e) => return finish(e),
}}}

// ───────────────────────── lifetime ──────────────────────────────────── //

/// Create an empty tree. Returns `Success` **and** stores its id in `*out`
/// -- or an error code otherwise.
#[no_mangle]
pub extern "C" fn radix_tree_new(strict_wildcards: bool, out: *mut TreeId) -> ErrorCode {
    if out.is_null() {
        return finish(ErrorCode::InvalidHandle);
    }
    let tree = RadixTree::with_config(TreeConfig { strict_wildcards });
    unsafe { *out = register_handle(tree) };
    finish(ErrorCode::Success)
}

#[no_mangle]
pub extern "C" fn radix_tree_free(id: TreeId) -> ErrorCode {
    try_c!(unregister_handle(id));
    finish(ErrorCode::Success)
}

// ───────────────────────── routes ────────────────────────────────────── //

#[no_mangle]
pub extern "C" fn radix_tree_add_route(
    id: TreeId,
    pattern_utf8: *const c_char,
    route: u64,
) -> ErrorCode {
    let pattern = try_c!(cstr(pattern_utf8));
    match try_c!(with_handle_mut(id, |t| t.add_route(pattern, route))) {
        Ok(()) => finish(ErrorCode::Success),
        Err(e) => finish(map_error(&e)),
    }
}

/// Look `path_utf8` up. On a hit `*out_route` receives the route and
/// `*out_params_len` the number of parameters; when that number exceeds
/// `params_cap` the call returns `BufferTooSmall` after writing the route and
/// the required length. A miss returns `NotFound`.
#[no_mangle]
pub extern "C" fn radix_tree_search(
    id: TreeId,
    path_utf8: *const c_char,
    out_route: *mut u64,
    params: *mut RadixParamT,
    params_cap: usize,
    out_params_len: *mut usize,
) -> ErrorCode {
    if out_route.is_null() || out_params_len.is_null() || (params.is_null() && params_cap > 0) {
        return finish(ErrorCode::InvalidHandle);
    }
    let path = try_c!(cstr(path_utf8));
    let base = path.as_ptr() as usize;

    let code = try_c!(with_handle(id, |t| {
        let found = t.search(path);
        let Some(&route) = found.handle else {
            return ErrorCode::NotFound;
        };
        unsafe {
            *out_route = route;
            *out_params_len = found.params.len();
        }
        if found.params.len() > params_cap {
            return ErrorCode::BufferTooSmall;
        }
        for (i, p) in found.params.iter().enumerate() {
            unsafe {
                *params.add(i) = RadixParamT {
                    key: p.key.as_ptr(),
                    key_len: p.key.len(),
                    value_offset: p.value.as_ptr() as usize - base,
                    value_len: p.value.len(),
                };
            }
        }
        ErrorCode::Success
    }));
    finish(code)
}

#[no_mangle]
pub extern "C" fn radix_tree_len(id: TreeId, out: *mut usize) -> ErrorCode {
    if out.is_null() {
        return finish(ErrorCode::InvalidHandle);
    }
    let len = try_c!(with_handle(id, |t| t.len()));
    unsafe { *out = len };
    finish(ErrorCode::Success)
}
