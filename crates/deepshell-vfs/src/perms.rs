//! Permission evaluation.

use crate::mode::{Capability, Triad};
use crate::node::{Directory, Meta};

/// The privileged identity. It passes every check.
pub const ROOT_USER: &str = "root";

/// Whether `user` holds `cap` on a node with metadata `meta`.
///
/// The owner triad applies when `user` owns the node, the group triad when
/// the node's group is named after `user`, the other triad otherwise.
pub fn has_permission(meta: &Meta, user: &str, cap: Capability) -> bool {
    if user == ROOT_USER {
        return true;
    }
    let triad = if meta.owner == user {
        Triad::Owner
    } else if meta.group == user {
        Triad::Group
    } else {
        Triad::Other
    };
    meta.mode.allows(triad, cap)
}

/// Whether `user` may unlink `child` from `parent`.
///
/// Write on the parent is required. In a sticky directory the user must
/// also own the parent or the child. A missing child is deletable.
pub fn can_delete(parent: &Directory, child: &str, user: &str) -> bool {
    if user == ROOT_USER {
        return true;
    }
    if !has_permission(&parent.meta, user, Capability::Write) {
        return false;
    }
    if !parent.meta.mode.is_sticky() {
        return true;
    }
    let Some(node) = parent.get(child) else {
        return true;
    };
    let allowed = parent.meta.owner == user || node.meta().owner == user;
    log::debug!(
        "sticky check: user={user} child={child} owner={} -> {}",
        node.meta().owner,
        if allowed { "allow" } else { "deny" }
    );
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::node::Node;

    fn meta(mode: &str, owner: &str, group: &str) -> Meta {
        Meta::new(mode.parse().unwrap(), owner, group)
    }

    #[test]
    fn owner_group_other_matrix() {
        let m = meta("rw-r-----", "alice", "ops");

        assert!(has_permission(&m, "alice", Capability::Read));
        assert!(has_permission(&m, "alice", Capability::Write));

        assert!(has_permission(&m, "ops", Capability::Read));
        assert!(!has_permission(&m, "ops", Capability::Write));

        assert!(!has_permission(&m, "mallory", Capability::Read));
        assert!(!has_permission(&m, "mallory", Capability::Write));
    }

    #[test]
    fn root_always_passes() {
        let m = meta("---------", "alice", "alice");
        assert!(has_permission(&m, ROOT_USER, Capability::Read));
        assert!(has_permission(&m, ROOT_USER, Capability::Write));
        assert!(has_permission(&m, ROOT_USER, Capability::Execute));
    }

    #[test]
    fn owner_triad_wins_even_when_more_restrictive() {
        let m = meta("---r--r--", "alice", "alice");
        assert!(!has_permission(&m, "alice", Capability::Read));
        assert!(has_permission(&m, "bob", Capability::Read));
    }

    #[test]
    fn execute_accepts_markers() {
        assert!(has_permission(&meta("rws------", "a", "a"), "a", Capability::Execute));
        assert!(has_permission(&meta("rwxrwxrwt", "a", "a"), "b", Capability::Execute));
        assert!(!has_permission(&meta("rwxrwxrwT", "a", "a"), "b", Capability::Execute));
    }

    fn dir_with_child(mode: &str, dir_owner: &str, child_owner: &str) -> Directory {
        let mut d = Directory::new(meta(mode, dir_owner, dir_owner));
        d.insert(
            "f",
            Node::text(Mode::FILE_DEFAULT, child_owner, child_owner, "x"),
        );
        d
    }

    #[test]
    fn delete_needs_parent_write() {
        let d = dir_with_child("rwxr-xr-x", "root", "guest");
        assert!(!can_delete(&d, "f", "guest"));
    }

    #[test]
    fn delete_in_plain_writable_dir() {
        let d = dir_with_child("rwxrwxrwx", "root", "operator");
        assert!(can_delete(&d, "f", "guest"));
    }

    #[test]
    fn sticky_denies_non_owner_with_write() {
        let d = dir_with_child("rwxrwxrwt", "root", "operator");
        assert!(!can_delete(&d, "f", "guest"));
    }

    #[test]
    fn sticky_allows_child_owner() {
        let d = dir_with_child("rwxrwxrwt", "root", "guest");
        assert!(can_delete(&d, "f", "guest"));
    }

    #[test]
    fn sticky_allows_parent_owner() {
        let d = dir_with_child("rwxrwxrwt", "guest", "operator");
        assert!(can_delete(&d, "f", "guest"));
    }

    #[test]
    fn sticky_allows_root() {
        let d = dir_with_child("rwxrwxrwt", "operator", "operator");
        assert!(can_delete(&d, "f", ROOT_USER));
    }

    #[test]
    fn missing_child_is_deletable() {
        let d = dir_with_child("rwxrwxrwt", "root", "operator");
        assert!(can_delete(&d, "ghost", "guest"));
    }
}
