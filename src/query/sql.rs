//! Translates typed filters into parameterised Postgres queries.
//!
//! Every value goes through `push_bind`; only fixed column names and sort
//! directions are written into the SQL text.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ClientFilter, MaterialFilter, Predicate, ProjectQuery, ProjectSortField, SortOrder};

/// Escape LIKE metacharacters and wrap the text for a substring match.
pub fn like_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Search(text) => {
            let pattern = like_pattern(text);
            builder
                .push("(name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR project_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        Predicate::StatusIn(statuses) => {
            let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            builder.push("status = ANY(").push_bind(values).push(")");
        }
        Predicate::ClientIn(ids) => {
            builder.push("client_id = ANY(").push_bind(ids.clone()).push(")");
        }
        Predicate::ModulesOverlap(modules) => {
            let values: Vec<String> = modules.iter().map(|m| m.as_str().to_string()).collect();
            builder.push("modules && ").push_bind(values);
        }
        Predicate::CreatedFrom(from) => {
            builder.push("created_at >= ").push_bind(*from);
        }
        Predicate::CreatedUntil(until) => {
            builder.push("created_at <= ").push_bind(*until);
        }
        Predicate::ClientCity(city) => {
            builder
                .push("client_id IN (SELECT id FROM clients WHERE address->>'city' ILIKE ")
                .push_bind(escape_like(city))
                .push(")");
        }
    }
}

/// Append `WHERE p1 AND p2 ...`. Nothing is written for an empty list.
pub fn push_predicates(builder: &mut QueryBuilder<'static, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate(builder, predicate);
    }
}

fn project_order(field: ProjectSortField, order: SortOrder) -> String {
    let dir = order.as_sql();
    match field {
        ProjectSortField::Name => format!("name {dir}, id ASC"),
        ProjectSortField::CreatedAt => format!("created_at {dir}, id ASC"),
        ProjectSortField::UpdatedAt => format!("updated_at {dir}, id ASC"),
        ProjectSortField::EndDate => {
            format!("(timeline->>'endDate') {dir} NULLS LAST, id ASC")
        }
    }
}

pub fn select_projects(query: &ProjectQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM projects");
    push_predicates(&mut builder, &query.predicates);
    builder.push(" ORDER BY ");
    builder.push(project_order(query.sort_by, query.sort_order));
    builder
        .push(" LIMIT ")
        .push_bind(query.limit)
        .push(" OFFSET ")
        .push_bind(query.offset);
    builder
}

pub fn count_projects(predicates: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM projects");
    push_predicates(&mut builder, predicates);
    builder
}

fn push_client_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &ClientFilter) {
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" WHERE (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR tax_id ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub fn select_clients(filter: &ClientFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM clients");
    push_client_filter(&mut builder, filter);
    builder.push(format!(
        " ORDER BY {} {}, id ASC",
        filter.sort_by.column(),
        filter.sort_order.as_sql()
    ));
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(filter.offset());
    builder
}

pub fn count_clients(filter: &ClientFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM clients");
    push_client_filter(&mut builder, filter);
    builder
}

fn push_joiner(builder: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    builder.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn push_material_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &MaterialFilter) {
    let mut first = true;

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        push_joiner(builder, &mut first);
        builder
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR supplier ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        push_joiner(builder, &mut first);
        builder.push_bind(category.clone()).push(" = ANY(category)");
    }
    if let Some(unit) = filter.unit {
        push_joiner(builder, &mut first);
        builder.push("unit = ").push_bind(unit.as_str().to_string());
    }
    if filter.low_stock {
        push_joiner(builder, &mut first);
        builder.push("stock < min_stock");
    }
}

pub fn select_materials(filter: &MaterialFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM materials");
    push_material_filter(&mut builder, filter);
    builder.push(format!(
        " ORDER BY {} {}, id ASC",
        filter.sort_by.column(),
        filter.sort_order.as_sql()
    ));
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(filter.offset());
    builder
}

pub fn count_materials(filter: &MaterialFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM materials");
    push_material_filter(&mut builder, filter);
    builder
}

/// Contacts of the given clients, oldest first within each client.
pub fn select_contacts_for(client_ids: &[Uuid]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM contact_persons WHERE client_id = ANY(");
    builder
        .push_bind(client_ids.to_vec())
        .push(") ORDER BY client_id, created_at ASC, id ASC");
    builder
}
