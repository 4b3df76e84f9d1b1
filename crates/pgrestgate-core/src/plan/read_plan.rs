//! Read (SELECT) query planning.

use super::types::*;
use crate::api_request::{
    ApiRequest, JoinType, OrderTerm, QualifiedIdentifier, Range, SelectItem,
};
use crate::error::{Error, Result};
use crate::schema_cache::{Cardinality, Junction, Relationship, SchemaCache, Table};
use serde::{Deserialize, Serialize};

/// A read plan for a single table/view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadPlan {
    /// Columns to select
    pub select: Vec<CoercibleSelectField>,
    /// Source table
    pub from: QualifiedIdentifier,
    /// Table alias
    pub from_alias: Option<String>,
    /// WHERE conditions
    pub where_clauses: Vec<CoercibleLogicTree>,
    /// ORDER BY terms
    pub order: Vec<CoercibleOrderTerm>,
    /// Pagination range
    pub range: Range,
    /// Relation name (for embedding)
    pub rel_name: String,
    /// Relationship to parent (if embedded)
    pub rel_to_parent: Option<Relationship>,
    /// Join conditions correlating this embed to its parent row
    pub rel_join_conds: Vec<JoinCondition>,
    /// Many-to-many junction, when this embed is reached through one
    pub rel_junction: Option<Junction>,
    /// Join type requested for the embed (`!inner`/`!left`)
    pub rel_join_type: Option<JoinType>,
    /// Alias the embed's aggregated JSON result is exposed under
    pub agg_alias: String,
    /// Whether this embed's columns are spread into the parent row
    pub is_spread: bool,
    /// Nesting depth
    pub depth: u32,
}

impl ReadPlan {
    /// Create a read plan from an API request.
    pub fn from_request(
        request: &ApiRequest,
        table: &Table,
        schema_cache: &SchemaCache,
    ) -> Result<Self> {
        let _ = schema_cache;
        let qi = table.qualified_identifier();

        let select = build_select_fields(&request.query_params.select, table)?;
        let where_clauses = build_where_clauses(request, table, &[])?;
        let order = build_order_terms(request, table, &[])?;

        Ok(Self {
            select,
            from: qi,
            from_alias: None,
            where_clauses,
            order,
            range: request.top_level_range.clone(),
            rel_name: table.name.clone(),
            rel_to_parent: None,
            rel_join_conds: vec![],
            rel_junction: None,
            rel_join_type: None,
            agg_alias: table.name.clone(),
            is_spread: false,
            depth: 0,
        })
    }

    /// Build a full embed tree (root plus recursively embedded relations)
    /// for a plain read request.
    pub fn tree_from_request(
        request: &ApiRequest,
        table: &Table,
        schema_cache: &SchemaCache,
    ) -> Result<ReadPlanTree> {
        let root = Self::from_request(request, table, schema_cache)?;
        let children = build_embed_children(
            &request.query_params.select,
            table,
            schema_cache,
            request,
            &[],
        )?;
        Ok(ReadPlanTree { root, children })
    }

    /// Build an embed tree for returning mutation results, selecting from
    /// the mutation's CTE result instead of the base table directly.
    pub fn tree_for_mutation(
        request: &ApiRequest,
        table: &Table,
        schema_cache: &SchemaCache,
    ) -> Result<ReadPlanTree> {
        let mut tree = Self::tree_from_request(request, table, schema_cache)?;
        tree.root.from_alias = Some("pgrst_mutation_result".to_string());
        Ok(tree)
    }

    /// Check if this plan has any where clauses.
    pub fn has_where(&self) -> bool {
        !self.where_clauses.is_empty()
    }

    /// Check if this plan has any order terms.
    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    /// Check if this plan has pagination.
    pub fn has_pagination(&self) -> bool {
        self.range.limit.is_some() || self.range.offset > 0
    }
}

/// Build select fields from select items (columns only; relations are
/// handled separately by [`build_embed_children`]).
fn build_select_fields(
    items: &[SelectItem],
    table: &Table,
) -> Result<Vec<CoercibleSelectField>> {
    if items.is_empty() {
        // Default: select all columns
        return Ok(table
            .columns
            .iter()
            .map(|(name, col)| CoercibleSelectField::simple(name, &col.data_type))
            .collect());
    }

    let mut fields = Vec::new();

    for item in items {
        match item {
            SelectItem::Field {
                field,
                aggregate,
                aggregate_cast,
                cast,
                alias,
            } => {
                let column = table
                    .get_column(&field.name)
                    .ok_or_else(|| Error::ColumnNotFound(field.name.clone()))?;

                fields.push(CoercibleSelectField {
                    field: CoercibleField::from_field(field, &column.data_type),
                    aggregate: aggregate.clone(),
                    aggregate_cast: aggregate_cast.clone(),
                    cast: cast.clone(),
                    alias: alias.clone(),
                });
            }
            // Relations are embedded, not selected as plain columns.
            SelectItem::Relation { .. } | SelectItem::SpreadRelation { .. } => {}
        }
    }

    Ok(fields)
}

/// Build where clauses from request filters scoped to `path` (the root
/// when `path` is empty, or a given embed path).
fn build_where_clauses(
    request: &ApiRequest,
    table: &Table,
    path: &[String],
) -> Result<Vec<CoercibleLogicTree>> {
    let type_resolver = |name: &str| -> String {
        table
            .get_column(name)
            .map(|c| c.data_type.clone())
            .unwrap_or_else(|| "text".to_string())
    };

    let mut clauses = Vec::new();

    if path.is_empty() {
        for filter in &request.query_params.filters_root {
            let pg_type = type_resolver(&filter.field.name);
            clauses.push(CoercibleLogicTree::Stmt(CoercibleFilter::from_filter(
                filter, &pg_type,
            )));
        }
    } else {
        for (p, filter) in &request.query_params.filters {
            if p.as_slice() == path {
                let pg_type = type_resolver(&filter.field.name);
                clauses.push(CoercibleLogicTree::Stmt(CoercibleFilter::from_filter(
                    filter, &pg_type,
                )));
            }
        }
    }

    for (p, tree) in &request.query_params.logic {
        if p.as_slice() == path {
            clauses.push(CoercibleLogicTree::from_logic_tree(tree, type_resolver));
        }
    }

    Ok(clauses)
}

/// Build order terms from the request scoped to `path`.
fn build_order_terms(
    request: &ApiRequest,
    table: &Table,
    path: &[String],
) -> Result<Vec<CoercibleOrderTerm>> {
    let mut terms = Vec::new();

    for (p, order_terms) in &request.query_params.order {
        if p.as_slice() == path {
            for term in order_terms {
                let field_name = match term {
                    OrderTerm::Field { field, .. } => &field.name,
                    OrderTerm::Relation { field, .. } => &field.name,
                };

                let pg_type = table
                    .get_column(field_name)
                    .map(|c| c.data_type.as_str())
                    .unwrap_or("text");

                terms.push(CoercibleOrderTerm::from_order_term(term, pg_type));
            }
        }
    }

    Ok(terms)
}

/// Recursively build the embed tree for every relation/spread item in
/// `items`, resolving each against the schema cache.
fn build_embed_children(
    items: &[SelectItem],
    table: &Table,
    schema_cache: &SchemaCache,
    request: &ApiRequest,
    path: &[String],
) -> Result<Vec<ReadPlanTree>> {
    let mut children = Vec::new();

    for item in items {
        match item {
            SelectItem::Relation {
                relation,
                alias,
                hint,
                join_type,
                select,
            } => {
                children.push(build_embed_child(
                    relation,
                    alias.as_deref(),
                    hint.as_deref(),
                    join_type.clone(),
                    select,
                    false,
                    table,
                    schema_cache,
                    request,
                    path,
                )?);
            }
            SelectItem::SpreadRelation {
                relation,
                hint,
                join_type,
            } => {
                children.push(build_embed_child(
                    relation,
                    None,
                    hint.as_deref(),
                    join_type.clone(),
                    &[],
                    true,
                    table,
                    schema_cache,
                    request,
                    path,
                )?);
            }
            SelectItem::Field { .. } => {}
        }
    }

    Ok(children)
}

/// Resolve and build a single embed (and its own nested embeds).
#[allow(clippy::too_many_arguments)]
fn build_embed_child(
    relation: &str,
    alias: Option<&str>,
    hint: Option<&str>,
    join_type: Option<JoinType>,
    nested_select: &[SelectItem],
    is_spread: bool,
    parent_table: &Table,
    schema_cache: &SchemaCache,
    request: &ApiRequest,
    path: &[String],
) -> Result<ReadPlanTree> {
    let rel = schema_cache
        .find_relationship_for_embed(
            &parent_table.qualified_identifier(),
            relation,
            hint,
            &parent_table.schema,
        )?
        .clone();

    let foreign_qi = rel.foreign_table().clone();
    let foreign_table = schema_cache.require_table(&foreign_qi)?;

    let mut child_path = path.to_vec();
    child_path.push(relation.to_string());
    let path_key = child_path.join(".");

    let select = build_select_fields(nested_select, foreign_table)?;
    let where_clauses = build_where_clauses(request, foreign_table, &child_path)?;
    let order = build_order_terms(request, foreign_table, &child_path)?;
    let range = request
        .query_params
        .ranges
        .get(&path_key)
        .cloned()
        .unwrap_or_default();
    let (rel_join_conds, rel_junction) = build_join_conditions(parent_table, &rel);
    let children = build_embed_children(
        nested_select,
        foreign_table,
        schema_cache,
        request,
        &child_path,
    )?;

    let agg_alias = alias
        .map(|s| s.to_string())
        .unwrap_or_else(|| relation.to_string());
    let depth = path.len() as u32 + 1;

    let root = ReadPlan {
        select,
        from: foreign_qi,
        from_alias: None,
        where_clauses,
        order,
        range,
        rel_name: relation.to_string(),
        rel_to_parent: Some(rel),
        rel_join_conds,
        rel_junction,
        rel_join_type: join_type,
        agg_alias,
        is_spread,
        depth,
    };

    Ok(ReadPlanTree { root, children })
}

/// Compute the join conditions correlating an embed to its parent row,
/// plus the junction table for many-to-many embeds.
///
/// `Cardinality::O2M`'s `columns` are loaded as `(child_col, parent_col)`
/// rather than `(table_col, foreign_table_col)` like every other
/// cardinality variant, so that pair order is swapped here rather than
/// relied upon directly.
fn build_join_conditions(
    parent_table: &Table,
    rel: &Relationship,
) -> (Vec<JoinCondition>, Option<Junction>) {
    let parent_qi = parent_table.qualified_identifier();
    let foreign_qi = rel.foreign_table().clone();

    match rel {
        Relationship::ForeignKey { cardinality, .. } => match cardinality {
            Cardinality::O2M { columns, .. } => (
                columns
                    .iter()
                    .map(|(child_col, parent_col)| JoinCondition {
                        left: (parent_qi.clone(), parent_col.clone()),
                        right: (foreign_qi.clone(), child_col.clone()),
                    })
                    .collect(),
                None,
            ),
            Cardinality::M2O { columns, .. } | Cardinality::O2O { columns, .. } => (
                columns
                    .iter()
                    .map(|(table_col, foreign_col)| JoinCondition {
                        left: (parent_qi.clone(), table_col.clone()),
                        right: (foreign_qi.clone(), foreign_col.clone()),
                    })
                    .collect(),
                None,
            ),
            Cardinality::M2M(junction) => (
                junction
                    .source_columns
                    .iter()
                    .map(|(parent_col, junction_col)| JoinCondition {
                        left: (parent_qi.clone(), parent_col.clone()),
                        right: (junction.table.clone(), junction_col.clone()),
                    })
                    .collect(),
                Some(junction.clone()),
            ),
        },
        // Computed relationships are resolved via their function call at
        // execution time; no static join condition applies here.
        Relationship::Computed { .. } => (vec![], None),
    }
}

/// A tree of read plans (for nested embedding).
#[derive(Clone, Debug)]
pub struct ReadPlanTree {
    /// Root plan
    pub root: ReadPlan,
    /// Child plans (embedded resources)
    pub children: Vec<ReadPlanTree>,
}

impl ReadPlanTree {
    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            root: ReadPlan {
                select: vec![],
                from: QualifiedIdentifier::unqualified(""),
                from_alias: None,
                where_clauses: vec![],
                order: vec![],
                range: Range::default(),
                rel_name: String::new(),
                rel_to_parent: None,
                rel_join_conds: vec![],
                rel_junction: None,
                rel_join_type: None,
                agg_alias: String::new(),
                is_spread: false,
                depth: 0,
            },
            children: vec![],
        }
    }

    /// Create a leaf tree (no children).
    pub fn leaf(plan: ReadPlan) -> Self {
        Self {
            root: plan,
            children: vec![],
        }
    }

    /// Add a child tree.
    pub fn add_child(&mut self, child: ReadPlanTree) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_plan_tree_empty() {
        let tree = ReadPlanTree::empty();
        assert!(tree.root.select.is_empty());
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_join_conditions_o2m_swaps_columns() {
        use crate::schema_cache::{Column, ColumnMap};

        let mut columns = ColumnMap::new();
        columns.insert(
            "id".to_string(),
            Column {
                name: "id".into(),
                description: None,
                nullable: false,
                data_type: "integer".into(),
                nominal_type: "int4".into(),
                max_len: None,
                default: None,
                enum_values: vec![],
                is_pk: true,
                position: 1,
            },
        );

        let parent = Table {
            schema: "public".into(),
            name: "authors".into(),
            description: None,
            is_view: false,
            insertable: true,
            updatable: true,
            deletable: true,
            pk_cols: vec!["id".into()],
            columns,
        };

        // O2M as loaded: table=authors, foreign_table=books, but columns
        // carry the un-reversed (child_col, parent_col) pair.
        let rel = Relationship::ForeignKey {
            table: QualifiedIdentifier::new("public", "authors"),
            foreign_table: QualifiedIdentifier::new("public", "books"),
            is_self: false,
            cardinality: Cardinality::O2M {
                constraint: "books_author_id_fkey".into(),
                columns: vec![("author_id".into(), "id".into())],
            },
            table_is_view: false,
            foreign_table_is_view: false,
            constraint_name: "books_author_id_fkey".into(),
        };

        let (conds, junction) = build_join_conditions(&parent, &rel);
        assert!(junction.is_none());
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].left.1, "id");
        assert_eq!(conds[0].right.1, "author_id");
    }
}
