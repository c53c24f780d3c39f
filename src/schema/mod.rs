//! Static entity metadata.
//!
//! Each persisted entity is described by an [`EntityDescriptor`] built at
//! compile time; request handlers and the store adapter consult it instead of
//! reflecting over storage metadata at call time. Binding a new entity to the
//! API surface means adding one descriptor here.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub unique: bool,
    /// Server-assigned default (e.g. creation timestamp); skipped during
    /// required-field validation.
    pub has_default: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Route segment under `/api/` and the table name.
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Client-settable fields; the primary key is tracked separately and is
    /// immutable once assigned.
    pub fields: &'static [FieldSpec],
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: true, unique: false, has_default: false }
}

const fn unique(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: true, unique: true, has_default: false }
}

const fn optional(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: false, unique: false, has_default: false }
}

const fn defaulted(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: false, unique: false, has_default: true }
}

pub static DESCRIPTORS: &[EntityDescriptor] = &[
    EntityDescriptor {
        name: "usuarios",
        table: "usuarios",
        primary_key: "id",
        fields: &[
            required("nombre"),
            required("apellido"),
            unique("email"),
            required("password"),
            optional("telefono"),
            optional("direccion"),
            defaulted("fecha_registro"),
        ],
    },
    EntityDescriptor {
        name: "productos",
        table: "productos",
        primary_key: "id",
        fields: &[
            required("nombre"),
            optional("descripcion"),
            required("precio"),
            defaulted("stock"),
            optional("imagen"),
            required("categoria_id"),
            required("usuario_id"),
            defaulted("fecha_y_hora"),
        ],
    },
    EntityDescriptor {
        name: "servicios",
        table: "servicios",
        primary_key: "id",
        fields: &[
            required("nombre"),
            optional("descripcion"),
            required("precio"),
            optional("imagen"),
            required("categoria_id"),
            required("usuario_id"),
            defaulted("fecha_y_hora"),
        ],
    },
    EntityDescriptor {
        name: "categorias",
        table: "categorias",
        primary_key: "id",
        fields: &[unique("nombre"), optional("descripcion")],
    },
    EntityDescriptor {
        name: "carritos",
        table: "carritos",
        primary_key: "id",
        fields: &[
            required("usuario_id"),
            required("producto_id"),
            required("cantidad"),
            defaulted("fecha_y_hora"),
        ],
    },
    EntityDescriptor {
        name: "compras",
        table: "compras",
        primary_key: "id",
        fields: &[
            required("usuario_id"),
            required("producto_id"),
            required("cantidad"),
            required("total"),
            defaulted("fecha_y_hora"),
        ],
    },
    EntityDescriptor {
        name: "reportes",
        table: "reportes",
        primary_key: "id",
        fields: &[
            required("usuario_id"),
            optional("producto_id"),
            required("motivo"),
            optional("descripcion"),
            defaulted("fecha_y_hora"),
        ],
    },
];

/// Registry lookup by route segment. Unknown names mean 404 at the API layer.
pub fn descriptor_for(name: &str) -> Option<&'static EntityDescriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields accepted by equality lookups; includes the primary key.
    pub fn is_queryable_field(&self, name: &str) -> bool {
        name == self.primary_key || self.field(name).is_some()
    }

    /// Fields a client may write. The primary key is excluded.
    pub fn is_mutable_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Required, non-defaulted fields that are absent, null, or empty in
    /// `data`.
    pub fn missing_required_fields(&self, data: &Map<String, Value>) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required && !f.has_default)
            .filter(|f| match data.get(f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            })
            .map(|f| f.name)
            .collect()
    }
}
