//! OpenAPI document generated from the resolved catalog.

use crate::config::{ColumnInfo, ColumnKind, ResolvedEntity, ResolvedModel};
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{
    HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathsBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::{Response, ResponseBuilder};
use utoipa::openapi::schema::{ArrayBuilder, ComponentsBuilder, ObjectBuilder, Ref, Schema, Type};
use utoipa::openapi::{OpenApi, OpenApiBuilder, RefOr, Required};

/// Fixed path the document is served at.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

const ERROR_SCHEMA: &str = "Error";
const DELETE_SCHEMA: &str = "DeleteOutcome";

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

fn reference(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn json_response(description: &str, schema: RefOr<Schema>) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content("application/json", ContentBuilder::new().schema(Some(schema)).build())
        .build()
}

fn error_response(description: &str) -> Response {
    json_response(description, reference(ERROR_SCHEMA))
}

fn column_type(kind: ColumnKind) -> Type {
    match kind {
        ColumnKind::Text => Type::String,
        ColumnKind::Integer => Type::Integer,
        ColumnKind::Numeric => Type::Number,
        ColumnKind::Boolean => Type::Boolean,
    }
}

fn column_schema(col: &ColumnInfo) -> RefOr<Schema> {
    let rule = &col.validation;
    let mut b = ObjectBuilder::new()
        .schema_type(column_type(col.kind))
        .description(col.description.clone());
    if let Some(n) = rule.max_length {
        b = b.max_length(Some(n as usize));
    }
    if let Some(n) = rule.min_length {
        b = b.min_length(Some(n as usize));
    }
    if let Some(p) = &rule.pattern {
        b = b.pattern(Some(p.clone()));
    }
    if let Some(n) = rule.minimum {
        b = b.minimum(Some(n));
    }
    if let Some(n) = rule.exclusive_minimum {
        b = b.exclusive_minimum(Some(n));
    }
    if let Some(n) = rule.maximum {
        b = b.maximum(Some(n));
    }
    object(b)
}

/// Row as returned by reads and writes: the key plus every non-sensitive column.
fn record_schema(entity: &ResolvedEntity) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new()
        .description(entity.description.clone())
        .property(&entity.pk_column, object(ObjectBuilder::new().schema_type(Type::Integer).minimum(Some(1.0))))
        .required(&entity.pk_column);
    for col in &entity.columns {
        if entity.sensitive_columns.contains(&col.name) {
            continue;
        }
        b = b.property(&col.name, column_schema(col));
    }
    object(b)
}

/// Create body: every writable column, with the required ones marked.
fn input_schema(entity: &ResolvedEntity) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new();
    for col in &entity.columns {
        b = b.property(&col.name, column_schema(col));
        if col.required() {
            b = b.required(&col.name);
        }
    }
    object(b)
}

fn id_parameter() -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name("id")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .description(Some("Primary key (positive integer)"))
        .schema(Some(object(ObjectBuilder::new().schema_type(Type::Integer).minimum(Some(1.0)))))
        .build()
}

fn query_parameter(name: &str, ty: Type, description: String) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(object(ObjectBuilder::new().schema_type(ty))))
        .build()
}

fn body(entity: &ResolvedEntity, input: &str) -> utoipa::openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .description(Some(format!("Fields of {}", entity.path_segment)))
        .content(
            "application/json",
            ContentBuilder::new().schema(Some(reference(input))).build(),
        )
        .required(Some(Required::True))
        .build()
}

fn list_operation(entity: &ResolvedEntity, record: &str) -> Operation {
    let seg = &entity.path_segment;
    let mut op = OperationBuilder::new()
        .tag(seg.as_str())
        .operation_id(Some(format!("list_{}", seg)))
        .summary(Some(format!("List {}", seg)))
        .parameter(query_parameter("limit", Type::Integer, "Maximum number of rows (positive integer)".into()))
        .parameter(query_parameter("column", Type::String, "Column to filter on (requires filter)".into()))
        .parameter(query_parameter("filter", Type::String, "Substring the column must contain (requires column)".into()));
    for col in &entity.columns {
        if entity.sensitive_columns.contains(&col.name) {
            continue;
        }
        op = op.parameter(query_parameter(
            &col.name,
            Type::String,
            format!("Rows whose {} contains this substring", col.name),
        ));
    }
    op.response(
        "200",
        json_response(
            "Rows",
            RefOr::T(Schema::Array(ArrayBuilder::new().items(reference(record)).build())),
        ),
    )
    .response("400", error_response("Invalid limit or filter"))
    .response("500", error_response("Storage error"))
    .build()
}

fn entity_paths(entity: &ResolvedEntity, paths: PathsBuilder) -> PathsBuilder {
    let seg = &entity.path_segment;
    let record = seg.clone();
    let input = format!("{}_input", seg);

    let mut collection = PathItemBuilder::new();
    let mut item = PathItemBuilder::new();

    if entity.allows("read") {
        collection = collection.operation(HttpMethod::Get, list_operation(entity, &record));
        item = item.operation(
            HttpMethod::Get,
            OperationBuilder::new()
                .tag(seg.as_str())
                .operation_id(Some(format!("read_{}", seg)))
                .summary(Some(format!("Get one of {} by id", seg)))
                .parameter(id_parameter())
                .response("200", json_response("Row", reference(&record)))
                .response("400", error_response("Invalid id"))
                .response("404", error_response("No row with this id"))
                .build(),
        );
    }
    if entity.allows("create") {
        collection = collection.operation(
            HttpMethod::Post,
            OperationBuilder::new()
                .tag(seg.as_str())
                .operation_id(Some(format!("create_{}", seg)))
                .summary(Some(format!("Create one of {}", seg)))
                .request_body(Some(body(entity, &input)))
                .response("201", json_response("Created row", reference(&record)))
                .response("400", error_response("Missing or invalid fields"))
                .response("500", error_response("Storage error"))
                .build(),
        );
    }
    if entity.allows("update") {
        item = item.operation(
            HttpMethod::Put,
            OperationBuilder::new()
                .tag(seg.as_str())
                .operation_id(Some(format!("update_{}", seg)))
                .summary(Some(format!("Update one of {}; omitted fields keep their value", seg)))
                .parameter(id_parameter())
                .request_body(Some(body(entity, &input)))
                .response("200", json_response("Updated row", reference(&record)))
                .response("400", error_response("Invalid id or fields"))
                .response("404", error_response("No row with this id"))
                .build(),
        );
    }
    if entity.allows("delete") {
        item = item.operation(
            HttpMethod::Delete,
            OperationBuilder::new()
                .tag(seg.as_str())
                .operation_id(Some(format!("delete_{}", seg)))
                .summary(Some(format!("Delete one of {}", seg)))
                .parameter(id_parameter())
                .response("200", json_response("Delete outcome", reference(DELETE_SCHEMA)))
                .response("400", error_response("Invalid id"))
                .build(),
        );
    }

    paths
        .path(format!("/api/{}", seg), collection.build())
        .path(format!("/api/{}/{{id}}", seg), item.build())
}

pub fn build_openapi(model: &ResolvedModel) -> OpenApi {
    let info = InfoBuilder::new()
        .title(model.title.as_str())
        .version(model.version.as_str())
        .description(model.description.clone())
        .build();

    let error_detail = ObjectBuilder::new()
        .property("code", object(ObjectBuilder::new().schema_type(Type::String)))
        .required("code")
        .property("message", object(ObjectBuilder::new().schema_type(Type::String)))
        .required("message");
    let mut components = ComponentsBuilder::new()
        .schema(
            ERROR_SCHEMA,
            object(ObjectBuilder::new().property("error", object(error_detail)).required("error")),
        )
        .schema(
            DELETE_SCHEMA,
            object(
                ObjectBuilder::new()
                    .property("success", object(ObjectBuilder::new().schema_type(Type::Boolean)))
                    .required("success")
                    .property("deleted", object(ObjectBuilder::new().schema_type(Type::Boolean)))
                    .required("deleted"),
            ),
        );

    let mut paths = PathsBuilder::new();
    for entity in &model.entities {
        components = components
            .schema(entity.path_segment.as_str(), record_schema(entity))
            .schema(format!("{}_input", entity.path_segment), input_schema(entity));
        paths = entity_paths(entity, paths);
    }

    OpenApiBuilder::new()
        .info(info)
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}
