//! Route-level access control.
//!
//! Every protected request is made by a [`Principal`]. The [`Acl`] is an
//! ordered list of entries: the first entry matching one of the principal's
//! classes and the requested [`Permission`] decides, anything else is denied.
//! Ownership of individual records is checked by the engine.

use axum::http::Method;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    View,
    Create,
    Edit,
    Delete,
    ManageUsers,
}

impl Permission {
    /// Permission needed by a request on the user's own data.
    pub fn for_method(method: &Method) -> Self {
        if method == Method::POST {
            Self::Create
        } else if method == Method::PUT || method == Method::PATCH {
            Self::Edit
        } else if method == Method::DELETE {
            Self::Delete
        } else {
            Self::View
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrincipalClass {
    Authenticated,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

#[derive(Clone, Debug)]
pub struct AclEntry {
    pub access: Access,
    pub class: PrincipalClass,
    pub permissions: Vec<Permission>,
}

/// Identity attached to an authenticated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
}

impl Principal {
    fn has_class(&self, class: PrincipalClass) -> bool {
        match class {
            PrincipalClass::Authenticated => true,
            PrincipalClass::Admin => self.is_admin,
        }
    }
}

impl From<engine::User> for Principal {
    fn from(user: engine::User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Default for Acl {
    fn default() -> Self {
        use Permission::*;

        Self {
            entries: vec![
                AclEntry {
                    access: Access::Allow,
                    class: PrincipalClass::Admin,
                    permissions: vec![View, Create, Edit, Delete, ManageUsers],
                },
                AclEntry {
                    access: Access::Allow,
                    class: PrincipalClass::Authenticated,
                    permissions: vec![View, Create, Edit, Delete],
                },
                AclEntry {
                    access: Access::Deny,
                    class: PrincipalClass::Authenticated,
                    permissions: vec![ManageUsers],
                },
            ],
        }
    }
}

impl Acl {
    pub fn permits(&self, principal: &Principal, permission: Permission) -> bool {
        self.entries
            .iter()
            .find(|entry| {
                principal.has_class(entry.class) && entry.permissions.contains(&permission)
            })
            .is_some_and(|entry| entry.access == Access::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(is_admin: bool) -> Principal {
        Principal {
            user_id: 1,
            email: "a@example.com".to_string(),
            is_admin,
        }
    }

    #[test]
    fn users_manage_their_own_data_only() {
        let acl = Acl::default();
        let user = principal(false);
        for permission in [
            Permission::View,
            Permission::Create,
            Permission::Edit,
            Permission::Delete,
        ] {
            assert!(acl.permits(&user, permission));
        }
        assert!(!acl.permits(&user, Permission::ManageUsers));
    }

    #[test]
    fn admins_manage_users() {
        assert!(Acl::default().permits(&principal(true), Permission::ManageUsers));
    }

    #[test]
    fn empty_acl_denies() {
        let acl = Acl { entries: vec![] };
        assert!(!acl.permits(&principal(true), Permission::View));
    }

    #[test]
    fn first_matching_entry_wins() {
        let acl = Acl {
            entries: vec![
                AclEntry {
                    access: Access::Deny,
                    class: PrincipalClass::Authenticated,
                    permissions: vec![Permission::Delete],
                },
                AclEntry {
                    access: Access::Allow,
                    class: PrincipalClass::Authenticated,
                    permissions: vec![Permission::View, Permission::Delete],
                },
            ],
        };
        let user = principal(false);
        assert!(!acl.permits(&user, Permission::Delete));
        assert!(acl.permits(&user, Permission::View));
    }

    #[test]
    fn principal_is_built_from_user() {
        let user = engine::User {
            id: 9,
            email: "boss@example.com".to_string(),
            name: "Boss".to_string(),
            is_admin: true,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(
            Principal::from(user),
            Principal {
                user_id: 9,
                email: "boss@example.com".to_string(),
                is_admin: true,
            }
        );
    }

    #[test]
    fn method_maps_to_permission() {
        assert_eq!(Permission::for_method(&Method::GET), Permission::View);
        assert_eq!(Permission::for_method(&Method::POST), Permission::Create);
        assert_eq!(Permission::for_method(&Method::PUT), Permission::Edit);
        assert_eq!(Permission::for_method(&Method::DELETE), Permission::Delete);
    }
}
