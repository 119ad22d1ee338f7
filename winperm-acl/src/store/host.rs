//! Descriptor store backed by the host security API.

use super::DescriptorStore;
use crate::descriptor::{
    Ace, AceKind, Dacl, DescriptorControl, ObjectKind, SecurityAttributes, SecurityDescriptor,
    SecurityInformation,
};
use crate::error::{HostError, HostResult};
use std::ffi::{c_void, OsStr};
use std::os::windows::ffi::OsStrExt;
use tracing::trace;
use windows_sys::Win32::Foundation::{GetLastError, LocalFree, ERROR_SUCCESS, HLOCAL};
use windows_sys::Win32::Security::Authorization::{
    GetNamedSecurityInfoW, SetEntriesInAclW, SetNamedSecurityInfoW, EXPLICIT_ACCESS_W,
    TRUSTEE_IS_NAME, TRUSTEE_IS_SID, TRUSTEE_IS_UNKNOWN, TRUSTEE_W,
};
use windows_sys::Win32::Security::{
    AclSizeInformation, AddAccessAllowedAceEx, AddAccessDeniedAceEx, GetAce, GetAclInformation,
    GetSecurityDescriptorControl, InitializeAcl, InitializeSecurityDescriptor,
    SetSecurityDescriptorControl, SetSecurityDescriptorDacl, SetSecurityDescriptorGroup,
    SetSecurityDescriptorOwner, ACCESS_ALLOWED_ACE, ACE_HEADER, ACL, ACL_SIZE_INFORMATION, PSID,
    SECURITY_ATTRIBUTES, SECURITY_DESCRIPTOR,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateDirectoryW, GetFileAttributesW, INVALID_FILE_ATTRIBUTES,
};
use winperm_access::{AccessMask, AceFlags, ExplicitAccess, Trustee};
use winperm_sid::{copy_sid, Sid};

const ACCESS_ALLOWED_ACE_TYPE: u8 = 0;
const ACCESS_DENIED_ACE_TYPE: u8 = 1;
const ACL_REVISION: u32 = 2;
const SECURITY_DESCRIPTOR_REVISION: u32 = 1;

/// Store that reads and writes real filesystem descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostStore;

impl HostStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorStore for HostStore {
    fn exists(&self, path: &str) -> HostResult<bool> {
        let wide = to_wide(path);
        // SAFETY: `wide` is a NUL-terminated UTF-16 string.
        let attributes = unsafe { GetFileAttributesW(wide.as_ptr()) };
        if attributes != INVALID_FILE_ATTRIBUTES {
            return Ok(true);
        }
        match HostError::from_win32("GetFileAttributesW", path, last_error()) {
            HostError::NotFound { .. } => Ok(false),
            err => Err(err),
        }
    }

    fn create_with_security(&self, path: &str, attributes: &SecurityAttributes) -> HostResult<()> {
        let wide = to_wide(path);
        let mut raw = RawDescriptor::new();
        let mut sa = SECURITY_ATTRIBUTES {
            nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
            lpSecurityDescriptor: std::ptr::null_mut(),
            bInheritHandle: i32::from(attributes.inherit_handle),
        };
        if let Some(descriptor) = &attributes.descriptor {
            raw.fill(path, descriptor)?;
            sa.lpSecurityDescriptor = raw.as_ptr();
        }

        // SAFETY: `wide` is NUL-terminated; `sa` and the descriptor buffers it
        // points into live in `raw` until after the call.
        let ok = unsafe { CreateDirectoryW(wide.as_ptr(), &sa) };
        if ok == 0 {
            return Err(HostError::from_win32("CreateDirectoryW", path, last_error()));
        }
        trace!("Created directory {}", path);
        Ok(())
    }

    fn set_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
        owner: Option<&Sid>,
        group: Option<&Sid>,
        dacl: Option<&Dacl>,
    ) -> HostResult<()> {
        let mut wide = to_wide(path);
        let mut owner_buf = owner.map(sid_buffer);
        let mut group_buf = group.map(sid_buffer);
        let mut acl_buf = dacl.map(encode_acl).transpose()?;

        let psid_owner = owner_buf
            .as_mut()
            .map_or(std::ptr::null_mut(), |b| b.as_mut_ptr() as PSID);
        let psid_group = group_buf
            .as_mut()
            .map_or(std::ptr::null_mut(), |b| b.as_mut_ptr() as PSID);
        let pacl = acl_buf
            .as_mut()
            .map_or(std::ptr::null(), |b| b.as_ptr() as *const ACL);

        // SAFETY: every pointer is either null or points into a buffer that
        // outlives the call.
        let code = unsafe {
            SetNamedSecurityInfoW(
                wide.as_mut_ptr(),
                kind.code(),
                info.bits(),
                psid_owner,
                psid_group,
                pacl,
                std::ptr::null(),
            )
        };
        if code != ERROR_SUCCESS {
            return Err(HostError::from_win32("SetNamedSecurityInfoW", path, code));
        }
        Ok(())
    }

    fn get_security(
        &self,
        path: &str,
        kind: ObjectKind,
        info: SecurityInformation,
    ) -> HostResult<SecurityDescriptor> {
        let mut wide = to_wide(path);
        let mut owner: PSID = std::ptr::null_mut();
        let mut group: PSID = std::ptr::null_mut();
        let mut dacl: *mut ACL = std::ptr::null_mut();
        let mut sd: *mut c_void = std::ptr::null_mut();

        // SAFETY: out-pointers are valid locals; `sd` is freed below.
        let code = unsafe {
            GetNamedSecurityInfoW(
                wide.as_mut_ptr(),
                kind.code(),
                info.bits(),
                &mut owner,
                &mut group,
                &mut dacl,
                std::ptr::null_mut(),
                &mut sd,
            )
        };
        if code != ERROR_SUCCESS {
            return Err(HostError::from_win32("GetNamedSecurityInfoW", path, code));
        }
        let _guard = LocalGuard(sd);

        let mut descriptor = SecurityDescriptor::default();
        // SAFETY: the pointers returned by GetNamedSecurityInfoW point into
        // `sd`, which stays alive until `_guard` drops.
        unsafe {
            if info.contains(SecurityInformation::OWNER) && !owner.is_null() {
                descriptor.owner = Some(copy_sid(owner)?);
            }
            if info.contains(SecurityInformation::GROUP) && !group.is_null() {
                descriptor.group = Some(copy_sid(group)?);
            }
            if info.contains(SecurityInformation::DACL) {
                if !dacl.is_null() {
                    descriptor.dacl = Some(decode_acl(dacl)?);
                }
                let mut control = 0u16;
                let mut revision = 0u32;
                if GetSecurityDescriptorControl(sd, &mut control, &mut revision) == 0 {
                    return Err(HostError::from_win32(
                        "GetSecurityDescriptorControl",
                        path,
                        last_error(),
                    ));
                }
                descriptor.control = DescriptorControl::from_bits_truncate(control);
            }
        }
        Ok(descriptor)
    }

    fn build_dacl(&self, entries: &[ExplicitAccess]) -> HostResult<Dacl> {
        if entries.is_empty() {
            return Ok(Dacl::default());
        }

        // Name and SID buffers must outlive SetEntriesInAclW.
        let mut names: Vec<Vec<u16>> = Vec::new();
        let mut sids: Vec<Vec<u64>> = Vec::new();
        for entry in entries {
            match entry.trustee() {
                Trustee::Sid(sid) => sids.push(sid_buffer(sid)),
                Trustee::Name(name) => names.push(to_wide(name)),
            }
        }

        let (mut next_name, mut next_sid) = (0, 0);
        let explicit: Vec<EXPLICIT_ACCESS_W> = entries
            .iter()
            .map(|entry| {
                let (form, ptr) = match entry.trustee() {
                    Trustee::Sid(_) => {
                        next_sid += 1;
                        (TRUSTEE_IS_SID, sids[next_sid - 1].as_mut_ptr() as *mut u16)
                    }
                    Trustee::Name(_) => {
                        next_name += 1;
                        (TRUSTEE_IS_NAME, names[next_name - 1].as_mut_ptr())
                    }
                };
                EXPLICIT_ACCESS_W {
                    grfAccessPermissions: entry.permissions().bits(),
                    grfAccessMode: entry.mode().code(),
                    grfInheritance: u32::from(entry.inheritance().ace_flags().bits()),
                    Trustee: TRUSTEE_W {
                        pMultipleTrustee: std::ptr::null_mut(),
                        MultipleTrusteeOperation: 0,
                        TrusteeForm: form,
                        TrusteeType: TRUSTEE_IS_UNKNOWN,
                        ptstrName: ptr,
                    },
                }
            })
            .collect();

        let mut acl: *mut ACL = std::ptr::null_mut();
        // SAFETY: `explicit` and the trustee buffers it references are alive;
        // the returned ACL is freed by the guard.
        let code = unsafe {
            SetEntriesInAclW(explicit.len() as u32, explicit.as_ptr(), std::ptr::null(), &mut acl)
        };
        if code != ERROR_SUCCESS {
            let subject = entries
                .iter()
                .find_map(|e| match e.trustee() {
                    Trustee::Name(name) => Some(name.as_str()),
                    Trustee::Sid(_) => None,
                })
                .unwrap_or("entries");
            return Err(HostError::from_win32("SetEntriesInAclW", subject, code));
        }
        let _guard = LocalGuard(acl as *mut c_void);
        // SAFETY: SetEntriesInAclW returned a valid ACL.
        unsafe { decode_acl(acl) }
    }
}

/// Self-referential descriptor assembled for object creation.
struct RawDescriptor {
    sd: Box<SECURITY_DESCRIPTOR>,
    owner: Option<Vec<u64>>,
    group: Option<Vec<u64>>,
    acl: Option<Vec<u64>>,
}

impl RawDescriptor {
    fn new() -> Self {
        Self {
            // SAFETY: SECURITY_DESCRIPTOR is plain data; InitializeSecurityDescriptor
            // sets every field that matters before use.
            sd: Box::new(unsafe { std::mem::zeroed() }),
            owner: None,
            group: None,
            acl: None,
        }
    }

    fn as_ptr(&mut self) -> *mut c_void {
        &mut *self.sd as *mut SECURITY_DESCRIPTOR as *mut c_void
    }

    fn fill(&mut self, path: &str, descriptor: &SecurityDescriptor) -> HostResult<()> {
        self.owner = descriptor.owner.as_ref().map(sid_buffer);
        self.group = descriptor.group.as_ref().map(sid_buffer);
        self.acl = descriptor.dacl.as_ref().map(encode_acl).transpose()?;
        let psd = self.as_ptr();

        // SAFETY: `psd` points to the boxed descriptor; SID and ACL buffers are
        // owned by `self` and outlive every use of the descriptor.
        unsafe {
            if InitializeSecurityDescriptor(psd, SECURITY_DESCRIPTOR_REVISION) == 0 {
                return Err(os_error("InitializeSecurityDescriptor", path));
            }
            if let Some(owner) = self.owner.as_mut() {
                if SetSecurityDescriptorOwner(psd, owner.as_mut_ptr() as PSID, 0) == 0 {
                    return Err(os_error("SetSecurityDescriptorOwner", path));
                }
            }
            if let Some(group) = self.group.as_mut() {
                if SetSecurityDescriptorGroup(psd, group.as_mut_ptr() as PSID, 0) == 0 {
                    return Err(os_error("SetSecurityDescriptorGroup", path));
                }
            }
            if let Some(acl) = self.acl.as_mut() {
                if SetSecurityDescriptorDacl(psd, 1, acl.as_ptr() as *const ACL, 0) == 0 {
                    return Err(os_error("SetSecurityDescriptorDacl", path));
                }
            }
            let protected = DescriptorControl::DACL_PROTECTED.bits();
            if descriptor.control.contains(DescriptorControl::DACL_PROTECTED)
                && SetSecurityDescriptorControl(psd, protected, protected) == 0
            {
                return Err(os_error("SetSecurityDescriptorControl", path));
            }
        }
        Ok(())
    }
}

struct LocalGuard(*mut c_void);

impl Drop for LocalGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the pointer was allocated by the host with LocalAlloc.
            unsafe {
                LocalFree(self.0 as HLOCAL);
            }
        }
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

fn last_error() -> u32 {
    // SAFETY: reads thread-local state only.
    unsafe { GetLastError() }
}

fn os_error(operation: &'static str, path: &str) -> HostError {
    HostError::from_win32(operation, path, last_error())
}

/// Copies a SID into an 8-byte aligned buffer the host can read.
fn sid_buffer(sid: &Sid) -> Vec<u64> {
    aligned(&sid.to_bytes())
}

fn aligned(bytes: &[u8]) -> Vec<u64> {
    let mut buf = vec![0u64; bytes.len().div_ceil(8)];
    // SAFETY: `buf` spans at least `bytes.len()` bytes.
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.as_mut_ptr() as *mut u8, bytes.len());
    }
    buf
}

/// Encodes a DACL in host layout, keeping entry order.
fn encode_acl(dacl: &Dacl) -> HostResult<Vec<u64>> {
    let header = std::mem::size_of::<ACL>();
    // ACCESS_ALLOWED_ACE and ACCESS_DENIED_ACE share a layout whose last
    // field is the first u32 of the SID.
    let ace_fixed = std::mem::size_of::<ACCESS_ALLOWED_ACE>() - std::mem::size_of::<u32>();
    let size: usize = header
        + dacl
            .aces
            .iter()
            .map(|ace| (ace_fixed + ace.sid.byte_len()).next_multiple_of(4))
            .sum::<usize>();
    let size = size.next_multiple_of(4);
    let mut buf = vec![0u64; size.div_ceil(8)];
    let pacl = buf.as_mut_ptr() as *mut ACL;

    // SAFETY: `buf` holds `size` bytes, enough for every ACE added below.
    unsafe {
        if InitializeAcl(pacl, size as u32, ACL_REVISION) == 0 {
            return Err(HostError::Malformed(format!(
                "InitializeAcl failed with error {}",
                last_error()
            )));
        }
        for ace in &dacl.aces {
            let mut sid = sid_buffer(&ace.sid);
            let flags = u32::from(ace.flags.bits());
            let ok = match ace.kind {
                AceKind::Allowed => AddAccessAllowedAceEx(
                    pacl,
                    ACL_REVISION,
                    flags,
                    ace.mask.bits(),
                    sid.as_mut_ptr() as PSID,
                ),
                AceKind::Denied => AddAccessDeniedAceEx(
                    pacl,
                    ACL_REVISION,
                    flags,
                    ace.mask.bits(),
                    sid.as_mut_ptr() as PSID,
                ),
            };
            if ok == 0 {
                return Err(HostError::Malformed(format!(
                    "adding {ace} failed with error {}",
                    last_error()
                )));
            }
        }
    }
    Ok(buf)
}

/// Decodes a host ACL. Entry kinds other than allowed and denied are
/// rejected.
///
/// # Safety
/// `acl` must point to a valid ACL.
unsafe fn decode_acl(acl: *const ACL) -> HostResult<Dacl> {
    // SAFETY: guaranteed by the caller; each ACE pointer comes from GetAce.
    unsafe {
        let mut info: ACL_SIZE_INFORMATION = std::mem::zeroed();
        let ok = GetAclInformation(
            acl,
            &mut info as *mut _ as *mut c_void,
            std::mem::size_of::<ACL_SIZE_INFORMATION>() as u32,
            AclSizeInformation,
        );
        if ok == 0 {
            return Err(HostError::Malformed(format!(
                "GetAclInformation failed with error {}",
                last_error()
            )));
        }

        let mut aces = Vec::with_capacity(info.AceCount as usize);
        for index in 0..info.AceCount {
            let mut pace: *mut c_void = std::ptr::null_mut();
            if GetAce(acl, index, &mut pace) == 0 {
                return Err(HostError::Malformed(format!("ACE {index} is unreadable")));
            }
            let header = &*(pace as *const ACE_HEADER);
            let kind = match header.AceType {
                ACCESS_ALLOWED_ACE_TYPE => AceKind::Allowed,
                ACCESS_DENIED_ACE_TYPE => AceKind::Denied,
                other => {
                    return Err(HostError::Malformed(format!(
                        "ACE {index} has unsupported type {other}"
                    )));
                }
            };
            let body = &*(pace as *const ACCESS_ALLOWED_ACE);
            let sid = copy_sid(&body.SidStart as *const u32 as PSID)?;
            aces.push(Ace {
                kind,
                flags: AceFlags::from_bits_retain(header.AceFlags),
                mask: AccessMask::from_raw(body.Mask),
                sid,
            });
        }
        Ok(Dacl::new(aces))
    }
}
