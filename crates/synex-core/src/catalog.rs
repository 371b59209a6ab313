//! Predefined permission catalog.
//!
//! The modules and actions every deployment starts with, plus the UI groups
//! that organise them. Seeding inserts any entry whose name is missing and
//! leaves existing rows untouched.

use crate::models::permission::CreatePermission;
use crate::models::permission_group::CreatePermissionGroup;

/// `(module, action, description)`.
const PERMISSIONS: &[(&str, &str, &str)] = &[
    ("USER", "VIEW", "View users"),
    ("USER", "CREATE", "Create new users"),
    ("USER", "UPDATE", "Update user information"),
    ("USER", "DELETE", "Delete users"),
    ("USER", "ASSIGN_ROLES", "Assign roles to users"),
    ("USER", "RESET_PASSWORD", "Reset user passwords"),
    ("ROLE", "VIEW", "View roles"),
    ("ROLE", "CREATE", "Create new roles"),
    ("ROLE", "UPDATE", "Update role information"),
    ("ROLE", "DELETE", "Delete roles"),
    ("ROLE", "ASSIGN_PERMISSIONS", "Assign permissions to roles"),
    ("PRODUCT", "VIEW", "View products"),
    ("PRODUCT", "CREATE", "Create new products"),
    ("PRODUCT", "UPDATE", "Update product information"),
    ("PRODUCT", "DELETE", "Delete products"),
    ("PRODUCT", "EXPORT", "Export product data"),
    ("PRODUCT", "IMPORT", "Import product data"),
    ("PRODUCT_CATEGORY", "VIEW", "View product categories"),
    ("PRODUCT_CATEGORY", "CREATE", "Create product categories"),
    ("PRODUCT_CATEGORY", "UPDATE", "Update product categories"),
    ("PRODUCT_CATEGORY", "DELETE", "Delete product categories"),
    ("SAMPLE", "VIEW", "View samples"),
    ("SAMPLE", "CREATE", "Create new samples"),
    ("SAMPLE", "UPDATE", "Update sample information"),
    ("SAMPLE", "DELETE", "Delete samples"),
    ("SAMPLE", "DISPATCH", "Dispatch samples to customers"),
    ("SAMPLE", "TRACK", "Track sample status"),
    ("CUSTOMER", "VIEW", "View customers"),
    ("CUSTOMER", "CREATE", "Create new customers"),
    ("CUSTOMER", "UPDATE", "Update customer information"),
    ("CUSTOMER", "DELETE", "Delete customers"),
    ("CUSTOMER", "VIEW_ACTIVITY", "View customer activity logs"),
    ("ORDER", "VIEW", "View orders"),
    ("ORDER", "CREATE", "Create new orders"),
    ("ORDER", "UPDATE", "Update order information"),
    ("ORDER", "DELETE", "Delete orders"),
    ("ORDER", "APPROVE", "Approve orders"),
    ("ORDER", "CANCEL", "Cancel orders"),
    ("ORDER", "SHIP", "Ship orders"),
    ("WAREHOUSE", "VIEW", "View warehouse data"),
    ("WAREHOUSE", "CREATE", "Create warehouse entries"),
    ("WAREHOUSE", "UPDATE", "Update warehouse data"),
    ("WAREHOUSE", "DELETE", "Delete warehouse entries"),
    ("WAREHOUSE", "TRANSFER", "Transfer inventory"),
    ("FINANCE", "VIEW", "View financial data"),
    ("FINANCE", "CREATE", "Create financial records"),
    ("FINANCE", "UPDATE", "Update financial data"),
    ("FINANCE", "DELETE", "Delete financial records"),
    ("FINANCE", "APPROVE", "Approve financial transactions"),
    ("REPORT", "VIEW", "View reports"),
    ("REPORT", "CREATE", "Create custom reports"),
    ("REPORT", "EXPORT", "Export reports"),
    ("SYSTEM", "VIEW_LOGS", "View system logs"),
    ("SYSTEM", "MANAGE_SETTINGS", "Manage system settings"),
    ("SYSTEM", "BACKUP", "Perform system backup"),
    ("SYSTEM", "RESTORE", "Restore system from backup"),
];

/// `(group_name, display_name, module)`; sort order is the position + 1.
const GROUPS: &[(&str, &str, &str)] = &[
    ("USER_MANAGEMENT", "User Management", "USER"),
    ("ROLE_MANAGEMENT", "Role & Permission Management", "ROLE"),
    ("PRODUCT_MANAGEMENT", "Product Management", "PRODUCT"),
    ("CATEGORY_MANAGEMENT", "Category Management", "PRODUCT_CATEGORY"),
    ("SAMPLE_MANAGEMENT", "Sample Management", "SAMPLE"),
    ("CUSTOMER_MANAGEMENT", "Customer Management", "CUSTOMER"),
    ("ORDER_MANAGEMENT", "Order Management", "ORDER"),
    ("WAREHOUSE_MANAGEMENT", "Warehouse Management", "WAREHOUSE"),
    ("FINANCIAL_MANAGEMENT", "Financial Management", "FINANCE"),
    ("REPORTING", "Reports & Analytics", "REPORT"),
    ("SYSTEM_ADMINISTRATION", "System Administration", "SYSTEM"),
];

pub fn predefined_permissions() -> Vec<CreatePermission> {
    PERMISSIONS
        .iter()
        .map(|(module, action, description)| CreatePermission {
            description: Some((*description).to_string()),
            ..CreatePermission::new(*module, *action)
        })
        .collect()
}

pub fn predefined_groups() -> Vec<CreatePermissionGroup> {
    GROUPS
        .iter()
        .enumerate()
        .map(|(i, (group_name, display_name, module))| CreatePermissionGroup {
            group_name: (*group_name).to_string(),
            display_name: (*display_name).to_string(),
            description: String::new(),
            module: (*module).to_string(),
            sort_order: i as i64 + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn permission_names_are_unique() {
        let names: HashSet<String> = predefined_permissions()
            .iter()
            .map(CreatePermission::canonical_name)
            .collect();
        assert_eq!(names.len(), PERMISSIONS.len());
        assert!(names.contains("SAMPLE_DISPATCH"));
        assert!(names.contains("PRODUCT_CATEGORY_VIEW"));
    }

    #[test]
    fn every_group_module_has_permissions() {
        let modules: HashSet<&str> = PERMISSIONS.iter().map(|(m, _, _)| *m).collect();
        for group in predefined_groups() {
            assert!(modules.contains(group.module.as_str()), "{}", group.module);
        }
    }

    #[test]
    fn groups_are_ordered_from_one() {
        let groups = predefined_groups();
        assert_eq!(groups.first().map(|g| g.sort_order), Some(1));
        assert_eq!(groups.last().map(|g| g.sort_order), Some(11));
        assert_eq!(groups[10].group_name, "SYSTEM_ADMINISTRATION");
    }
}
