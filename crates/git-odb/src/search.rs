//! Multi-source object search logic.
//!
//! Search order: loose, then each pack in turn (newest-packed first, sorted
//! at discovery time). Loose objects are preferred because they may be
//! newer — e.g. written after the most recent repack.

use git_hash::ObjectId;
use git_object::Object;

use crate::{ObjectDatabase, ObjectInfo, OdbError};

/// Find an object by OID, searching loose storage then every pack in order.
pub(crate) fn find_object(
    odb: &ObjectDatabase,
    oid: &ObjectId,
) -> Result<Option<Object>, OdbError> {
    if let Some(obj) = odb.loose().read(oid)? {
        return Ok(Some(obj));
    }

    let packs = odb.packs();
    for pack in packs {
        // Cross-pack resolver so a REF_DELTA base can be found in loose
        // storage or another pack, not just the pack that holds the delta.
        let resolver = |base_oid: &ObjectId| -> Option<(git_object::ObjectType, Vec<u8>)> {
            if let Ok(Some(obj)) = odb.loose().read(base_oid) {
                return Some((obj.object_type(), obj.serialize_content()));
            }
            for other_pack in packs {
                if std::ptr::eq(other_pack, pack) {
                    continue;
                }
                if let Ok(Some(packed)) = other_pack.read_object(base_oid) {
                    return Some((packed.obj_type, packed.data));
                }
            }
            None
        };
        match pack.read_object_with_resolver(oid, resolver)? {
            Some(packed) => {
                let obj = Object::parse_content(packed.obj_type, &packed.data).map_err(|e| {
                    OdbError::Corrupt {
                        oid: *oid,
                        reason: e.to_string(),
                    }
                })?;
                return Ok(Some(obj));
            }
            None => continue,
        }
    }

    Ok(None)
}

/// Find an object header by OID, searching loose storage then every pack.
pub(crate) fn find_header(
    odb: &ObjectDatabase,
    oid: &ObjectId,
) -> Result<Option<ObjectInfo>, OdbError> {
    if let Some((obj_type, size)) = odb.loose().read_header(oid)? {
        return Ok(Some(ObjectInfo { obj_type, size }));
    }

    for pack in odb.packs() {
        match pack.read_object(oid)? {
            Some(packed) => {
                return Ok(Some(ObjectInfo {
                    obj_type: packed.obj_type,
                    size: packed.data.len(),
                }));
            }
            None => continue,
        }
    }

    Ok(None)
}

/// Check if an object exists in any backend (fast, no decompression for packs).
pub(crate) fn object_exists(odb: &ObjectDatabase, oid: &ObjectId) -> bool {
    if odb.loose().contains(oid) {
        return true;
    }

    odb.packs().iter().any(|pack| pack.contains(oid))
}
