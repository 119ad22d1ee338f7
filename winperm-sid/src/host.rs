//! Identity resolution against the host security API.

use crate::error::{SidError, SidResult};
use crate::resolver::IdentityResolver;
use crate::sid::Sid;
use crate::well_known::WellKnownSid;
use std::ffi::c_void;
use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE};
use windows_sys::Win32::Security::{
    CreateWellKnownSid, GetLengthSid, GetTokenInformation, IsValidSid, TokenPrimaryGroup,
    TokenUser, PSID, SECURITY_MAX_SID_SIZE, TOKEN_INFORMATION_CLASS, TOKEN_PRIMARY_GROUP,
    TOKEN_QUERY, TOKEN_USER,
};
use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

/// Resolves identities from the process token and the host's well-known SID
/// table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostResolver;

impl HostResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for HostResolver {
    fn current_user(&self) -> SidResult<Sid> {
        let token = ProcessToken::open().map_err(|e| SidError::resolution("current user", e))?;
        let buf = token
            .information(TokenUser)
            .map_err(|e| SidError::resolution("current user", e))?;
        // SAFETY: `information` returned a buffer filled by GetTokenInformation
        // for the TokenUser class, which starts with a TOKEN_USER.
        let psid = unsafe { (*(buf.as_ptr() as *const TOKEN_USER)).User.Sid };
        // SAFETY: the SID lives inside `buf`, which outlives this call.
        unsafe { copy_sid(psid) }.map_err(|e| SidError::resolution("current user", e.to_string()))
    }

    fn current_group(&self) -> SidResult<Sid> {
        let token = ProcessToken::open().map_err(|e| SidError::resolution("current group", e))?;
        let buf = token
            .information(TokenPrimaryGroup)
            .map_err(|e| SidError::resolution("current group", e))?;
        // SAFETY: as above, for TokenPrimaryGroup / TOKEN_PRIMARY_GROUP.
        let psid = unsafe { (*(buf.as_ptr() as *const TOKEN_PRIMARY_GROUP)).PrimaryGroup };
        // SAFETY: as above.
        unsafe { copy_sid(psid) }.map_err(|e| SidError::resolution("current group", e.to_string()))
    }

    fn well_known(&self, kind: WellKnownSid) -> SidResult<Sid> {
        let mut buf = [0u8; SECURITY_MAX_SID_SIZE as usize];
        let mut len = SECURITY_MAX_SID_SIZE;
        // SAFETY: `buf` is large enough for any SID and `len` carries its size.
        let ok = unsafe {
            CreateWellKnownSid(
                kind.code(),
                std::ptr::null_mut(),
                buf.as_mut_ptr() as PSID,
                &mut len,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(SidError::resolution(
                format!("well-known SID {kind}"),
                format!("CreateWellKnownSid failed with error {code}"),
            ));
        }
        Sid::from_bytes(&buf[..len as usize])
    }
}

/// Copies a host SID into an owned [`Sid`].
///
/// # Safety
/// `psid` must be null or point to memory holding a SID.
pub unsafe fn copy_sid(psid: PSID) -> SidResult<Sid> {
    if psid.is_null() {
        return Err(SidError::Malformed("null SID pointer".to_string()));
    }
    // SAFETY: the caller guarantees `psid` points to a SID; IsValidSid checks
    // its structure before GetLengthSid reads the header.
    unsafe {
        if IsValidSid(psid) == 0 {
            return Err(SidError::Malformed("host returned an invalid SID".to_string()));
        }
        let len = GetLengthSid(psid) as usize;
        Sid::from_bytes(std::slice::from_raw_parts(psid as *const u8, len))
    }
}

/// RAII wrapper for the current process' access token.
struct ProcessToken {
    handle: HANDLE,
}

impl ProcessToken {
    fn open() -> Result<Self, String> {
        let mut handle: HANDLE = std::ptr::null_mut();
        // SAFETY: GetCurrentProcess returns a pseudo-handle that is always
        // valid; the result is checked below.
        let ok = unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle) };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(format!("OpenProcessToken failed with error {code}"));
        }
        Ok(Self { handle })
    }

    /// Reads one token information class into an 8-byte aligned buffer.
    fn information(&self, class: TOKEN_INFORMATION_CLASS) -> Result<Vec<u64>, String> {
        let mut needed = 0u32;
        // SAFETY: a null buffer with zero length only asks for the size.
        unsafe {
            GetTokenInformation(self.handle, class, std::ptr::null_mut(), 0, &mut needed);
        }
        if needed == 0 {
            let code = unsafe { GetLastError() };
            return Err(format!("GetTokenInformation size query failed with error {code}"));
        }

        let mut buf = vec![0u64; (needed as usize).div_ceil(8)];
        // SAFETY: `buf` holds at least `needed` bytes.
        let ok = unsafe {
            GetTokenInformation(
                self.handle,
                class,
                buf.as_mut_ptr() as *mut c_void,
                needed,
                &mut needed,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(format!("GetTokenInformation failed with error {code}"));
        }
        Ok(buf)
    }
}

impl Drop for ProcessToken {
    fn drop(&mut self) {
        // SAFETY: `handle` was opened by OpenProcessToken and is closed once.
        unsafe {
            CloseHandle(self.handle);
        }
    }
}
