//! Query builder implementation.

use crate::api_request::{JoinType, JsonOperand, JsonOperation, QualifiedIdentifier};
use crate::error::{Error, Result};
use crate::plan::{
    CallPlan, CallParams, CoercibleFilter, CoercibleLogicTree, CoercibleOrderTerm,
    CoercibleSelectField, MutatePlan, ReadPlan, ReadPlanTree,
};
use pgrestgate_sql::{
    escape_ident, from_qi, DeleteBuilder, InsertBuilder, OrderExpr, SelectBuilder,
    SqlFragment, SqlParam, UpdateBuilder,
};

/// Query builder for converting plans to SQL.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build a SELECT query from a read plan tree.
    pub fn build_read(tree: &ReadPlanTree) -> Result<SqlFragment> {
        Self::build_select_body(tree, None)
    }

    /// Build a SELECT statement for `tree`, optionally correlated to
    /// `parent_ref` (the enclosing row, for an embedded relation).
    fn build_select_body(
        tree: &ReadPlanTree,
        parent_ref: Option<&QualifiedIdentifier>,
    ) -> Result<SqlFragment> {
        let plan = &tree.root;
        let mut builder = SelectBuilder::new();

        let sql_qi = pgrestgate_sql::identifier::QualifiedIdentifier::new(
            &plan.from.schema,
            &plan.from.name,
        );
        builder = match &plan.from_alias {
            Some(alias) => builder.from_table_as(&sql_qi, alias),
            None => builder.from_table(&sql_qi),
        };

        let self_ref_name = plan
            .from_alias
            .clone()
            .unwrap_or_else(|| plan.from.name.clone());

        // Many-to-many embeds join through their junction table; the
        // correlation to the parent row runs against the junction, not
        // the foreign table directly.
        if let Some(junction) = &plan.rel_junction {
            let condition = junction
                .target_columns
                .iter()
                .map(|(junction_col, target_col)| {
                    format!(
                        "{}.{} = {}.{}",
                        escape_ident(&junction.table.name),
                        escape_ident(junction_col),
                        escape_ident(&self_ref_name),
                        escape_ident(target_col)
                    )
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            builder = builder.inner_join(&junction.table.name, &condition);
        }

        // SELECT columns
        for field in &plan.select {
            let col_frag = Self::build_select_field(field)?;
            builder = builder.column_raw(col_frag);
        }

        let has_aggregate = plan.select.iter().any(|f| f.aggregate.is_some());

        // Embedded relations
        for child in &tree.children {
            let (join_frag, alias) = Self::build_embed_join(&plan.from, child)?;
            if child.root.is_spread {
                builder = builder.left_join_lateral(join_frag, &alias, "TRUE");
                for field in &child.root.select {
                    builder = builder.column_raw(Self::build_spread_column(&alias, field));
                }
            } else {
                builder = builder.left_join_lateral(join_frag, &alias, "TRUE");
                builder = builder.column_raw(Self::build_embed_select_col(child, &alias));

                if child.root.rel_join_type == Some(JoinType::Inner) {
                    let is_to_one = child
                        .root
                        .rel_to_parent
                        .as_ref()
                        .map(|r| r.is_to_one())
                        .unwrap_or(true);
                    let filter = if is_to_one {
                        format!("{}.pgrst_obj IS NOT NULL", escape_ident(&alias))
                    } else {
                        format!("{}.pgrst_agg <> '[]'::json", escape_ident(&alias))
                    };
                    builder = builder.where_raw(SqlFragment::raw(filter));
                }
            }
        }

        // GROUP BY: implicit whenever an aggregate projection is present,
        // grouping by every non-aggregated selected column.
        if has_aggregate {
            for field in &plan.select {
                if field.aggregate.is_none() {
                    builder = builder.group_by(&field.field.name);
                }
            }
        }

        // Correlation to the parent row, for embedded relations.
        if let Some(parent_qi) = parent_ref {
            for cond in &plan.rel_join_conds {
                let left_table = if cond.left.0 == *parent_qi {
                    parent_qi.name.clone()
                } else {
                    cond.left.0.name.clone()
                };
                let right_table = if plan.rel_junction.is_some() {
                    cond.right.0.name.clone()
                } else {
                    self_ref_name.clone()
                };
                let raw = format!(
                    "{}.{} = {}.{}",
                    escape_ident(&left_table),
                    escape_ident(&cond.left.1),
                    escape_ident(&right_table),
                    escape_ident(&cond.right.1)
                );
                builder = builder.where_raw(SqlFragment::raw(raw));
            }
        }

        // WHERE clauses
        for clause in &plan.where_clauses {
            let expr = Self::build_logic_tree(clause)?;
            builder = builder.where_raw(expr);
        }

        // ORDER BY
        for term in &plan.order {
            let order = Self::build_order_term(term);
            builder = builder.order_by(order);
        }

        // LIMIT/OFFSET
        if let Some(limit) = plan.range.limit {
            builder = builder.limit(limit);
        }
        if plan.range.offset > 0 {
            builder = builder.offset(plan.range.offset);
        }

        Ok(builder.build())
    }

    /// Build the LATERAL subquery and alias for an embedded relation.
    ///
    /// To-one embeds collapse to a single JSON object via `row_to_json`,
    /// to-many embeds aggregate via `json_agg`, and spread embeds are
    /// left as a plain row so their columns can be selected individually.
    fn build_embed_join(
        parent_table: &QualifiedIdentifier,
        child: &ReadPlanTree,
    ) -> Result<(SqlFragment, String)> {
        let plan = &child.root;
        let inner = Self::build_select_body(child, Some(parent_table))?;

        let wrapped = if plan.is_spread {
            inner
        } else {
            let is_to_one = plan
                .rel_to_parent
                .as_ref()
                .map(|r| r.is_to_one())
                .unwrap_or(true);

            let mut frag = if is_to_one {
                SqlFragment::raw("SELECT row_to_json(pgrst_sub) AS pgrst_obj FROM (")
            } else {
                SqlFragment::raw(
                    "SELECT coalesce(json_agg(pgrst_sub), '[]'::json) AS pgrst_agg FROM (",
                )
            };
            frag.append(inner);
            frag.push(") pgrst_sub");
            frag
        };

        let alias = format!("pgrst_{}", plan.agg_alias);
        Ok((wrapped, alias))
    }

    /// Build the parent-side select column pulling an embed's aggregated
    /// JSON value out of its LATERAL alias.
    fn build_embed_select_col(child: &ReadPlanTree, alias: &str) -> SqlFragment {
        let plan = &child.root;
        let is_to_one = plan
            .rel_to_parent
            .as_ref()
            .map(|r| r.is_to_one())
            .unwrap_or(true);

        let column = if is_to_one { "pgrst_obj" } else { "pgrst_agg" };
        SqlFragment::raw(format!(
            "{}.{} AS {}",
            escape_ident(alias),
            column,
            escape_ident(&plan.agg_alias)
        ))
    }

    /// Build a single spread-embed column: `<alias>.<col> AS <col>`.
    fn build_spread_column(alias: &str, field: &CoercibleSelectField) -> SqlFragment {
        let name = field.alias.as_deref().unwrap_or(&field.field.name);
        SqlFragment::raw(format!(
            "{}.{} AS {}",
            escape_ident(alias),
            escape_ident(&field.field.name),
            escape_ident(name)
        ))
    }

    /// Render a JSON path as a chain of `->`/`->>` operators with
    /// parameterized keys/indices.
    fn push_json_path(frag: &mut SqlFragment, json_path: &[JsonOperation]) {
        for op in json_path {
            match op {
                JsonOperation::Arrow(operand) => {
                    frag.push("->");
                    Self::push_json_operand(frag, operand);
                }
                JsonOperation::DoubleArrow(operand) => {
                    frag.push("->>");
                    Self::push_json_operand(frag, operand);
                }
            }
        }
    }

    fn push_json_operand(frag: &mut SqlFragment, operand: &JsonOperand) {
        match operand {
            JsonOperand::Key(key) => {
                frag.push_param(SqlParam::Text(key.clone()));
            }
            JsonOperand::Idx(idx) => {
                frag.push_param(SqlParam::Int(*idx as i64));
            }
        }
    }

    /// Build a SELECT field.
    fn build_select_field(field: &CoercibleSelectField) -> Result<SqlFragment> {
        let mut frag = SqlFragment::new();

        // Aggregate function
        if let Some(agg) = &field.aggregate {
            frag.push(agg.to_sql());
            frag.push("(");
        }

        // Column name with JSON path
        let mut column = SqlFragment::new();
        column.push(&escape_ident(&field.field.name));
        if !field.field.json_path.is_empty() {
            Self::push_json_path(&mut column, &field.field.json_path);
        }

        let needs_parens =
            !field.field.json_path.is_empty() && (field.cast.is_some() || field.aggregate.is_some());
        if needs_parens {
            frag.append(column.parens());
        } else {
            frag.append(column);
        }

        // Close aggregate
        if field.aggregate.is_some() {
            frag.push(")");

            if let Some(agg_cast) = &field.aggregate_cast {
                frag.push("::");
                frag.push(agg_cast);
            }
        }

        // Cast
        if let Some(cast) = &field.cast {
            frag.push("::");
            frag.push(cast);
        }

        // Alias
        if let Some(alias) = &field.alias {
            frag.push(" AS ");
            frag.push(&escape_ident(alias));
        }

        Ok(frag)
    }

    /// Build a logic tree.
    fn build_logic_tree(tree: &CoercibleLogicTree) -> Result<SqlFragment> {
        match tree {
            CoercibleLogicTree::Expr { negated, op, children } => {
                let sep = match op {
                    crate::api_request::LogicOperator::And => " AND ",
                    crate::api_request::LogicOperator::Or => " OR ",
                };

                let child_frags: Result<Vec<_>> = children
                    .iter()
                    .map(|c| Self::build_logic_tree(c))
                    .collect();

                let mut combined = SqlFragment::join(sep, child_frags?).parens();

                if *negated {
                    let mut neg = SqlFragment::raw("NOT ");
                    neg.append(combined);
                    combined = neg;
                }

                Ok(combined)
            }
            CoercibleLogicTree::Stmt(filter) => Self::build_filter(filter),
            CoercibleLogicTree::NullEmbed { negated, field_name } => {
                let mut frag = SqlFragment::new();
                frag.push(&escape_ident(field_name));
                if *negated {
                    frag.push(" IS NOT NULL");
                } else {
                    frag.push(" IS NULL");
                }
                Ok(frag)
            }
        }
    }

    /// Build a filter expression.
    fn build_filter(filter: &CoercibleFilter) -> Result<SqlFragment> {
        let inner = Self::build_filter_unnegated(filter)?;

        if filter.op_expr.negated {
            let mut frag = SqlFragment::raw("NOT ");
            frag.append(inner.parens());
            Ok(frag)
        } else {
            Ok(inner)
        }
    }

    /// Build a filter's column/operator/value, without the outer negation.
    fn build_filter_unnegated(filter: &CoercibleFilter) -> Result<SqlFragment> {
        let mut frag = SqlFragment::new();

        // Column name
        frag.push(&escape_ident(&filter.field.name));

        // Operation
        match &filter.op_expr.operation {
            crate::api_request::Operation::Simple { op, value } => {
                frag.push(" ");
                frag.push(op.to_sql());
                frag.push(" ");
                frag.push_param(value.clone());
            }
            crate::api_request::Operation::Quant { op, quantifier, value } => {
                frag.push(" ");
                frag.push(op.to_sql());
                frag.push(" ");
                if let Some(q) = quantifier {
                    match q {
                        crate::api_request::OpQuantifier::Any => frag.push("ANY("),
                        crate::api_request::OpQuantifier::All => frag.push("ALL("),
                    };
                    frag.push_param(value.clone());
                    frag.push(")");
                } else {
                    frag.push_param(value.clone());
                }
            }
            crate::api_request::Operation::In(values) => {
                frag.push(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        frag.push(", ");
                    }
                    frag.push_param(v.clone());
                }
                frag.push(")");
            }
            crate::api_request::Operation::Is(is_val) => {
                frag.push(" IS ");
                frag.push(is_val.to_sql());
            }
            crate::api_request::Operation::IsDistinctFrom(value) => {
                frag.push(" IS DISTINCT FROM ");
                frag.push_param(value.clone());
            }
            crate::api_request::Operation::Fts { op, language, value } => {
                frag.push(" @@ ");
                frag.push(op.to_function());
                frag.push("(");
                if let Some(lang) = language {
                    frag.push_param(lang.clone());
                    frag.push(", ");
                }
                frag.push_param(value.clone());
                frag.push(")");
            }
        }

        Ok(frag)
    }

    /// Build an ORDER BY term.
    fn build_order_term(term: &CoercibleOrderTerm) -> OrderExpr {
        let mut order = OrderExpr::new(&term.field.name);

        if let Some(dir) = &term.direction {
            order = match dir {
                crate::api_request::OrderDirection::Asc => order.asc(),
                crate::api_request::OrderDirection::Desc => order.desc(),
            };
        }

        if let Some(nulls) = &term.nulls {
            order = match nulls {
                crate::api_request::OrderNulls::First => order.nulls_first(),
                crate::api_request::OrderNulls::Last => order.nulls_last(),
            };
        }

        order
    }

    /// Render a single JSON value as a parameterized cell, cast to the
    /// column's declared type. `NULL` JSON values render as SQL NULL
    /// without a cast so they work against any column type.
    fn json_cell(value: &serde_json::Value, ir_type: &str) -> SqlFragment {
        let mut frag = SqlFragment::new();

        if value.is_null() {
            frag.push("NULL");
            return frag;
        }

        if ir_type.contains("json") {
            if ir_type.is_empty() {
                frag.push_param(SqlParam::Json(value.clone()));
            } else {
                frag.push_typed_param(SqlParam::Json(value.clone()), ir_type);
            }
            return frag;
        }

        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if ir_type.is_empty() {
            frag.push_param(SqlParam::Text(text));
        } else {
            frag.push_typed_param(SqlParam::Text(text), ir_type);
        }
        frag
    }

    /// Parse a request body into one JSON object per row to insert/update.
    fn json_rows(body_bytes: &[u8]) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let value: serde_json::Value =
            serde_json::from_slice(body_bytes).map_err(|e| Error::InvalidBody(e.to_string()))?;

        match value {
            serde_json::Value::Array(arr) => arr
                .into_iter()
                .map(|v| {
                    v.as_object()
                        .cloned()
                        .ok_or_else(|| Error::InvalidBody("array elements must be objects".into()))
                })
                .collect(),
            serde_json::Value::Object(map) => Ok(vec![map]),
            _ => Err(Error::InvalidBody("expected a JSON object or array of objects".into())),
        }
    }

    /// Build a mutation query.
    pub fn build_mutate(plan: &MutatePlan) -> Result<SqlFragment> {
        match plan {
            MutatePlan::Insert {
                target,
                columns,
                body,
                on_conflict,
                returning,
                apply_defaults,
                ..
            } => {
                let qi = pgrestgate_sql::identifier::QualifiedIdentifier::new(
                    &target.schema,
                    &target.name,
                );

                let mut builder = InsertBuilder::new().into_table(&qi);

                // Column names
                let col_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
                builder = builder.columns(col_names);

                if let Some(body_bytes) = body {
                    let rows = Self::json_rows(body_bytes)?;

                    for row in &rows {
                        let mut cells = Vec::with_capacity(columns.len());
                        for col in columns {
                            match row.get(&col.name) {
                                Some(value) => cells.push(Self::json_cell(value, &col.ir_type)),
                                None if *apply_defaults => {
                                    cells.push(SqlFragment::raw("DEFAULT"))
                                }
                                None => cells.push(SqlFragment::raw("NULL")),
                            }
                        }
                        builder = builder.values_raw(cells);
                    }
                }

                // ON CONFLICT
                if let Some((resolution, conflict_cols)) = on_conflict {
                    match resolution {
                        crate::api_request::PreferResolution::IgnoreDuplicates => {
                            builder = builder.on_conflict_do_nothing();
                        }
                        crate::api_request::PreferResolution::MergeDuplicates => {
                            let set_cols: Vec<(String, SqlFragment)> = columns
                                .iter()
                                .map(|c| {
                                    let mut frag = SqlFragment::new();
                                    frag.push("EXCLUDED.");
                                    frag.push(&escape_ident(&c.name));
                                    (c.name.clone(), frag)
                                })
                                .collect();
                            builder = builder.on_conflict_do_update(conflict_cols.clone(), set_cols);
                        }
                    }
                }

                // RETURNING
                for col in returning {
                    builder = builder.returning(col);
                }

                Ok(builder.build())
            }

            MutatePlan::Update {
                target,
                columns,
                body,
                where_clauses,
                returning,
                ..
            } => {
                let qi = pgrestgate_sql::identifier::QualifiedIdentifier::new(
                    &target.schema,
                    &target.name,
                );

                let mut builder = UpdateBuilder::new().table(&qi);

                if let Some(body_bytes) = body {
                    let rows = Self::json_rows(body_bytes)?;
                    let row = rows.first().ok_or_else(|| {
                        Error::MissingParameter("request body for UPDATE".into())
                    })?;

                    for col in columns {
                        if let Some(value) = row.get(&col.name) {
                            builder = builder.set_raw(&col.name, Self::json_cell(value, &col.ir_type));
                        }
                    }
                }

                for clause in where_clauses {
                    builder = builder.where_raw(Self::build_logic_tree(clause)?);
                }

                for col in returning {
                    builder = builder.returning(col);
                }

                Ok(builder.build())
            }

            MutatePlan::Delete {
                target,
                where_clauses,
                returning,
            } => {
                let qi = pgrestgate_sql::identifier::QualifiedIdentifier::new(
                    &target.schema,
                    &target.name,
                );

                let mut builder = DeleteBuilder::new().from_table(&qi);

                // WHERE
                for clause in where_clauses {
                    let expr = Self::build_logic_tree(clause)?;
                    builder = builder.where_raw(expr);
                }

                // RETURNING
                for col in returning {
                    builder = builder.returning(col);
                }

                Ok(builder.build())
            }
        }
    }

    /// Build an RPC call query.
    pub fn build_call(plan: &CallPlan) -> Result<SqlFragment> {
        let qi = pgrestgate_sql::identifier::QualifiedIdentifier::new(
            &plan.function.schema,
            &plan.function.name,
        );

        let mut frag = SqlFragment::new();
        frag.push("SELECT * FROM ");
        frag.push(&from_qi(&qi));
        frag.push("(");

        match &plan.params {
            CallParams::Named(params) => {
                for (i, (name, value, pg_type)) in params.iter().enumerate() {
                    if i > 0 {
                        frag.push(", ");
                    }
                    frag.push(&escape_ident(name));
                    frag.push(" => ");
                    frag.push_typed_param(SqlParam::Text(value.clone()), pg_type);
                }
            }
            CallParams::Positional(values) => {
                for (i, (value, pg_type)) in values.iter().enumerate() {
                    if i > 0 {
                        frag.push(", ");
                    }
                    frag.push_typed_param(SqlParam::Text(value.clone()), pg_type);
                }
            }
            CallParams::SingleObject(body) => {
                let body_str = String::from_utf8_lossy(body);
                frag.push_param(SqlParam::Text(body_str.to_string()));
            }
            CallParams::None => {}
        }

        frag.push(")");

        Ok(frag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_request::{OpExpr, Operation, QuantOperator};
    use crate::plan::CoercibleField;

    fn eq_filter(name: &str, ir_type: &str, value: &str) -> CoercibleFilter {
        CoercibleFilter {
            field: CoercibleField::simple(name, ir_type),
            op_expr: OpExpr {
                negated: false,
                operation: Operation::Quant {
                    op: QuantOperator::Equal,
                    quantifier: None,
                    value: value.to_string(),
                },
            },
        }
    }

    #[test]
    fn test_build_filter_simple() {
        let f = eq_filter("status", "text", "active");
        let frag = QueryBuilder::build_filter(&f).unwrap();
        assert_eq!(frag.sql(), "\"status\" = $1");
        assert_eq!(frag.params().len(), 1);
    }

    #[test]
    fn test_build_filter_negated() {
        let mut f = eq_filter("status", "text", "active");
        f.op_expr.negated = true;
        let frag = QueryBuilder::build_filter(&f).unwrap();
        assert_eq!(frag.sql(), "NOT (\"status\" = $1)");
    }

    #[test]
    fn test_build_filter_in() {
        let f = CoercibleFilter {
            field: CoercibleField::simple("id", "integer"),
            op_expr: OpExpr {
                negated: false,
                operation: Operation::In(vec!["1".to_string(), "2".to_string()]),
            },
        };
        let frag = QueryBuilder::build_filter(&f).unwrap();
        assert_eq!(frag.sql(), "\"id\" IN ($1, $2)");
        assert_eq!(frag.params().len(), 2);
    }

    #[test]
    fn test_build_mutate_insert() {
        let plan = MutatePlan::Insert {
            target: QualifiedIdentifier::new("public", "books"),
            columns: vec![
                CoercibleField::simple("title", "text"),
                CoercibleField::simple("author_id", "integer"),
            ],
            body: Some(bytes::Bytes::from_static(
                br#"{"title": "Dune", "author_id": 1}"#,
            )),
            on_conflict: None,
            where_clauses: vec![],
            returning: vec!["id".into()],
            pk_cols: vec!["id".into()],
            apply_defaults: true,
        };

        let frag = QueryBuilder::build_mutate(&plan).unwrap();
        assert!(frag.sql().starts_with("INSERT INTO \"public\".\"books\""));
        assert!(frag.sql().contains("RETURNING"));
        assert_eq!(frag.params().len(), 2);
    }

    #[test]
    fn test_build_mutate_update() {
        let plan = MutatePlan::Update {
            target: QualifiedIdentifier::new("public", "books"),
            columns: vec![CoercibleField::simple("title", "text")],
            body: Some(bytes::Bytes::from_static(br#"{"title": "Dune Messiah"}"#)),
            where_clauses: vec![CoercibleLogicTree::Stmt(eq_filter("id", "integer", "1"))],
            returning: vec!["id".into()],
            apply_defaults: false,
        };

        let frag = QueryBuilder::build_mutate(&plan).unwrap();
        assert!(frag.sql().starts_with("UPDATE \"public\".\"books\" SET"));
        assert!(frag.sql().contains("WHERE"));
    }

    #[test]
    fn test_build_mutate_delete() {
        let plan = MutatePlan::Delete {
            target: QualifiedIdentifier::new("public", "books"),
            where_clauses: vec![CoercibleLogicTree::Stmt(eq_filter("id", "integer", "1"))],
            returning: vec![],
        };

        let frag = QueryBuilder::build_mutate(&plan).unwrap();
        assert!(frag.sql().starts_with("DELETE FROM \"public\".\"books\""));
        assert_eq!(frag.params().len(), 1);
    }

    #[test]
    fn test_build_call_named() {
        let plan = CallPlan {
            function: QualifiedIdentifier::new("public", "search_books"),
            params: CallParams::Named(vec![(
                "query".to_string(),
                "dune".to_string(),
                "text".to_string(),
            )]),
            returns_scalar: false,
            returns_set: true,
            volatility: "Stable".to_string(),
        };

        let frag = QueryBuilder::build_call(&plan).unwrap();
        assert!(frag.sql().contains("\"query\" => $1::text"));
        assert_eq!(frag.params().len(), 1);
    }
}
