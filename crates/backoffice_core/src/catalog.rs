//! Built-in entity schemas for the back-office master screens

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::schema::{self, EntitySchema, EntitySchemaDef, FieldSpec, KeyKind};

const CODE_PATTERN: &str = "[A-Za-z0-9_-]+";

/// Property configuration, versioned by applicable-from date
pub fn property_codes() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("property_codes", "property-codes", "id")
        .lock_code_on_edit("property_code")
        .field(FieldSpec::number("id").label("ID"))
        .field(
            FieldSpec::text("property_code")
                .label("Property Code")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN),
        )
        .field(
            FieldSpec::text("property_name")
                .label("Property Name")
                .required()
                .max_length(100),
        )
        .field(
            FieldSpec::date("applicable_from")
                .label("Applicable From")
                .required(),
        )
        .field(
            FieldSpec::text("gst_number")
                .label("GST Number")
                .max_length(15)
                .pattern("[0-9A-Z]{15}"),
        )
        .field(FieldSpec::text("address").label("Address").max_length(255))
        .field(FieldSpec::boolean("is_active").label("Active"))
        .versioned("property_code", "applicable_from")
        .build()
}

pub fn outlets() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("outlets", "outlets", "id")
        .lock_code_on_edit("outlet_code")
        .field(FieldSpec::number("id").label("ID"))
        .field(
            FieldSpec::text("outlet_code")
                .label("Outlet Code")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN)
                .unique(),
        )
        .field(
            FieldSpec::text("outlet_name")
                .label("Outlet Name")
                .required()
                .max_length(60)
                .unique(),
        )
        .field(
            FieldSpec::text("property_code")
                .label("Property Code")
                .required()
                .max_length(10),
        )
        .field(FieldSpec::text("outlet_type").label("Outlet Type").max_length(30))
        .field(FieldSpec::boolean("is_active").label("Active"))
        .build()
}

pub fn item_departments() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("item_departments", "item-departments", "id")
        .lock_code_on_edit("department_code")
        .field(FieldSpec::number("id").label("ID"))
        .field(
            FieldSpec::text("department_code")
                .label("Department Code")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN)
                .unique(),
        )
        .field(
            FieldSpec::text("department_name")
                .label("Department Name")
                .required()
                .max_length(60),
        )
        .field(FieldSpec::text("outlet_code").label("Outlet").max_length(10))
        .field(FieldSpec::boolean("is_active").label("Active"))
        .build()
}

pub fn item_categories() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("item_categories", "item-categories", "id")
        .lock_code_on_edit("category_code")
        .field(FieldSpec::number("id").label("ID"))
        .field(
            FieldSpec::text("category_code")
                .label("Category Code")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN)
                .unique(),
        )
        .field(
            FieldSpec::text("category_name")
                .label("Category Name")
                .required()
                .max_length(60),
        )
        .field(
            FieldSpec::text("department_code")
                .label("Department")
                .required()
                .max_length(10),
        )
        .field(
            FieldSpec::number("display_order")
                .label("Display Order")
                .max_length(4)
                .pattern("[0-9]+"),
        )
        .field(FieldSpec::boolean("is_active").label("Active"))
        .build()
}

pub fn table_settings() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("table_settings", "table-settings", "id")
        .field(FieldSpec::number("id").label("ID"))
        .field(
            FieldSpec::text("table_number")
                .label("Table Number")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN)
                .unique(),
        )
        .field(
            FieldSpec::text("outlet_code")
                .label("Outlet")
                .required()
                .max_length(10),
        )
        .field(
            FieldSpec::number("capacity")
                .label("Capacity")
                .required()
                .max_length(3)
                .pattern("[0-9]+"),
        )
        .field(FieldSpec::text("section").label("Section").max_length(30))
        .field(FieldSpec::boolean("is_active").label("Active"))
        .build()
}

pub fn user_designations() -> schema::Result<EntitySchema> {
    EntitySchemaDef::new("user_designations", "user-designations", "designation_code")
        .key_kind(KeyKind::Natural)
        .lock_code_on_edit("designation_code")
        .field(
            FieldSpec::text("designation_code")
                .label("Designation Code")
                .required()
                .max_length(10)
                .pattern(CODE_PATTERN)
                .unique(),
        )
        .field(
            FieldSpec::text("designation_name")
                .label("Designation Name")
                .required()
                .max_length(60)
                .unique(),
        )
        .field(FieldSpec::text("description").label("Description").max_length(255))
        .field(FieldSpec::boolean("is_active").label("Active"))
        .build()
}

/// Entity schemas by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<String, Arc<EntitySchema>>,
}

impl Catalog {
    pub fn builtin() -> schema::Result<Self> {
        let mut catalog = Self::default();
        for schema in [
            property_codes()?,
            outlets()?,
            item_departments()?,
            item_categories()?,
            table_settings()?,
            user_designations()?,
        ] {
            catalog.insert(schema);
        }
        Ok(catalog)
    }

    /// Add a schema, replacing any existing one with the same name
    pub fn insert(&mut self, schema: EntitySchema) {
        self.schemas
            .insert(schema.name().to_string(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(name).cloned()
    }

    /// Look up by entity name or REST resource
    pub fn resolve(&self, name: &str) -> Result<Arc<EntitySchema>> {
        let normalized = name.replace('-', "_");
        self.schemas
            .get(&normalized)
            .or_else(|| self.schemas.values().find(|s| s.resource() == name))
            .cloned()
            .ok_or_else(|| CoreError::unknown_entity(name, self.names()))
    }

    pub fn names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.schemas.values()
    }
}
