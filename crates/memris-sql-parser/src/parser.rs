use hashbrown::HashMap;
use memris_expr::{ArgRef, Condition, ConditionArgs, Direction, JoinDescriptor, LogicalQuery, OrderItem, Projection, ProjectionItem, UpdateAssignment};
use memris_primitives::{ArgSlot, Combinator, JoinKind, OpCode, Operator, ReturnKind};
use memris_sats::StorageValue;
use memris_schema::EntityDef;

use crate::error::ParseError;
use crate::lexer::{tokenize, Keyword, Token};

/// What the caller's declared method return type looks like, enough to
/// check the invariants of spec.md §4.6 ("count queries require a numeric
/// return type", "UPDATE/DELETE return type must be void, int, or long").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnArity {
    Void,
    Numeric,
    NonNumeric,
}

/// Everything the parser needs beyond the query text itself: the root
/// entity, the schema for relationship traversal, the method's declared
/// parameter names (for named-parameter resolution), and the method-level
/// flags spec.md §4.6 checks against.
pub struct QueryContext<'a> {
    pub entity: &'a EntityDef,
    pub entities: &'a HashMap<String, EntityDef>,
    pub param_names: &'a [String],
    pub modifying: bool,
    pub native_query: bool,
    pub return_arity: ReturnArity,
}

/// One DNF leaf before it's flattened into the combinator-chained
/// `Condition` list `memris_expr` expects.
struct CondLeaf {
    path: Vec<String>,
    operator: Operator,
    args: ConditionArgs,
    case_ignore: bool,
}

enum BoolExpr {
    Or(Vec<BoolExpr>),
    And(Vec<BoolExpr>),
    Not(Box<BoolExpr>),
    Leaf(CondLeaf),
}

pub fn parse(src: &str, ctx: &QueryContext) -> Result<LogicalQuery, ParseError> {
    if ctx.native_query {
        return Err(ParseError::NativeQueryNotSupported);
    }
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0, entity: ctx.entity, entities: ctx.entities, param_names: ctx.param_names, aliases: HashMap::new() };
    match parser.peek() {
        Token::Keyword(Keyword::Select) => parser.parse_select(ctx),
        Token::Keyword(Keyword::Update) => parser.parse_update(ctx),
        Token::Keyword(Keyword::Delete) => parser.parse_delete(ctx),
        other => Err(ParseError::UnexpectedToken(format!("{other:?}"), parser.pos_offset())),
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    entity: &'a EntityDef,
    entities: &'a HashMap<String, EntityDef>,
    param_names: &'a [String],
    /// Maps a join/root alias to the dotted property-path prefix it
    /// stands for, so `WHERE d.city = ...` resolves through a join alias
    /// `d` the same way the root alias resolves directly to a field.
    aliases: HashMap<String, Vec<String>>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn pos_offset(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.peek() == &Token::Keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()))
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek() == &Token::Keyword(kw)
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(s) => Ok(s),
            other => Err(ParseError::UnexpectedToken(format!("{other:?}"), self.pos_offset())),
        }
    }

    fn resolve_path(&self, dotted: &str) -> Vec<String> {
        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        if segments.len() > 1 {
            if let Some(prefix) = self.aliases.get(&segments[0]) {
                let mut resolved = prefix.clone();
                resolved.extend(segments[1..].iter().cloned());
                return resolved;
            }
        }
        segments
    }

    fn parse_value(&mut self) -> Result<ArgRef, ParseError> {
        match self.advance() {
            Token::StringLit(s) => Ok(ArgRef::Literal(StorageValue::String(s))),
            Token::IntLit(n) => Ok(ArgRef::Literal(StorageValue::I64(n))),
            Token::DecimalLit(f) => Ok(ArgRef::Literal(StorageValue::F64(f))),
            Token::Keyword(Keyword::True) => Ok(ArgRef::Literal(StorageValue::Bool(true))),
            Token::Keyword(Keyword::False) => Ok(ArgRef::Literal(StorageValue::Bool(false))),
            Token::Keyword(Keyword::Null) => Ok(ArgRef::Literal(StorageValue::Null)),
            Token::NamedParam(name) => {
                let idx = self.param_names.iter().position(|p| p == &name).ok_or_else(|| ParseError::UnresolvedNamedParameter(name.clone()))?;
                Ok(ArgRef::Param(ArgSlot(idx as u16)))
            }
            Token::PositionalParam(n) => {
                if n == 0 {
                    return Err(ParseError::PositionalParameterOutOfRange(n));
                }
                Ok(ArgRef::Param(ArgSlot((n - 1) as u16)))
            }
            other => Err(ParseError::UnexpectedToken(format!("{other:?}"), self.pos_offset())),
        }
    }

    fn parse_in_list(&mut self) -> Result<Vec<ArgRef>, ParseError> {
        if self.peek() != &Token::LParen {
            return Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()));
        }
        self.advance();
        let mut items = vec![self.parse_value()?];
        while self.peek() == &Token::Comma {
            self.advance();
            items.push(self.parse_value()?);
        }
        if self.peek() != &Token::RParen {
            return Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()));
        }
        self.advance();
        Ok(items)
    }

    fn parse_condition_leaf(&mut self) -> Result<CondLeaf, ParseError> {
        let dotted = self.expect_ident()?;
        let path = self.resolve_path(&dotted);
        let leaf = |path: Vec<String>, operator: Operator, args: ConditionArgs, case_ignore: bool| CondLeaf { path, operator, args, case_ignore };

        match self.peek().clone() {
            Token::Eq => {
                self.advance();
                Ok(leaf(path, Operator::Eq, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::NotEq => {
                self.advance();
                Ok(leaf(path, Operator::Ne, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Lt => {
                self.advance();
                Ok(leaf(path, Operator::Lt, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Le => {
                self.advance();
                Ok(leaf(path, Operator::Le, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Gt => {
                self.advance();
                Ok(leaf(path, Operator::Gt, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Ge => {
                self.advance();
                Ok(leaf(path, Operator::Ge, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Keyword(Keyword::Like) => {
                self.advance();
                Ok(leaf(path, Operator::Like, ConditionArgs::One(self.parse_value()?), false))
            }
            Token::Keyword(Keyword::Ilike) => {
                self.advance();
                Ok(leaf(path, Operator::Like, ConditionArgs::One(self.parse_value()?), true))
            }
            Token::Keyword(Keyword::In) => {
                self.advance();
                Ok(leaf(path, Operator::In, ConditionArgs::Many(self.parse_in_list()?), false))
            }
            Token::Keyword(Keyword::Between) => {
                self.advance();
                let lo = self.parse_value()?;
                self.expect_keyword(Keyword::And)?;
                let hi = self.parse_value()?;
                Ok(leaf(path, Operator::Between, ConditionArgs::Two(lo, hi), false))
            }
            Token::Keyword(Keyword::Is) => {
                self.advance();
                if self.at_keyword(Keyword::Not) {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    Ok(leaf(path, Operator::IsNotNull, ConditionArgs::None, false))
                } else {
                    self.expect_keyword(Keyword::Null)?;
                    Ok(leaf(path, Operator::IsNull, ConditionArgs::None, false))
                }
            }
            Token::Keyword(Keyword::Not) => {
                self.advance();
                match self.advance() {
                    Token::Keyword(Keyword::Like) => Ok(leaf(path, Operator::NotLike, ConditionArgs::One(self.parse_value()?), false)),
                    Token::Keyword(Keyword::Ilike) => Ok(leaf(path, Operator::NotLike, ConditionArgs::One(self.parse_value()?), true)),
                    Token::Keyword(Keyword::In) => Ok(leaf(path, Operator::NotIn, ConditionArgs::Many(self.parse_in_list()?), false)),
                    other => Err(ParseError::UnexpectedToken(format!("{other:?}"), self.pos_offset())),
                }
            }
            other => Err(ParseError::UnexpectedToken(format!("{other:?}"), self.pos_offset())),
        }
    }

    fn parse_primary(&mut self) -> Result<BoolExpr, ParseError> {
        if self.peek() == &Token::LParen {
            self.advance();
            let inner = self.parse_or()?;
            if self.peek() != &Token::RParen {
                return Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()));
            }
            self.advance();
            return Ok(inner);
        }
        Ok(BoolExpr::Leaf(self.parse_condition_leaf()?))
    }

    fn parse_not(&mut self) -> Result<BoolExpr, ParseError> {
        if self.at_keyword(Keyword::Not) {
            self.advance();
            return Ok(BoolExpr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_primary()
    }

    fn parse_and(&mut self) -> Result<BoolExpr, ParseError> {
        let mut items = vec![self.parse_not()?];
        while self.at_keyword(Keyword::And) {
            self.advance();
            items.push(self.parse_not()?);
        }
        Ok(if items.len() == 1 { items.pop().unwrap() } else { BoolExpr::And(items) })
    }

    fn parse_or(&mut self) -> Result<BoolExpr, ParseError> {
        let mut items = vec![self.parse_and()?];
        while self.at_keyword(Keyword::Or) {
            self.advance();
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 { items.pop().unwrap() } else { BoolExpr::Or(items) })
    }

    fn parse_where_clause(&mut self) -> Result<Vec<Condition>, ParseError> {
        if !self.at_keyword(Keyword::Where) {
            return Ok(Vec::new());
        }
        self.advance();
        let expr = self.parse_or()?;
        let groups = to_dnf(expr)?;
        Ok(flatten(groups))
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderItem>, ParseError> {
        if !self.at_keyword(Keyword::Order) {
            return Ok(Vec::new());
        }
        self.advance();
        self.expect_keyword(Keyword::By)?;
        let mut items = Vec::new();
        loop {
            let dotted = self.expect_ident()?;
            let path = self.resolve_path(&dotted);
            let direction = if self.at_keyword(Keyword::Desc) {
                self.advance();
                Direction::Desc
            } else if self.at_keyword(Keyword::Asc) {
                self.advance();
                Direction::Asc
            } else {
                Direction::Asc
            };
            items.push(OrderItem { path, direction });
            if self.peek() == &Token::Comma {
                self.advance();
                continue;
            }
            break;
        }
        Ok(items)
    }

    /// `[LEFT] JOIN path [AS alias] [FETCH]`, repeated. Registers the
    /// alias (or the final path segment if no alias is given) so later
    /// clauses can resolve `alias.field` through it.
    fn parse_joins(&mut self) -> Result<Vec<JoinDescriptor>, ParseError> {
        let mut joins = Vec::new();
        loop {
            let kind = if self.at_keyword(Keyword::Left) {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinKind::Left
            } else if self.at_keyword(Keyword::Join) {
                self.advance();
                JoinKind::Inner
            } else {
                break;
            };
            let dotted = self.expect_ident()?;
            let path = self.resolve_path(&dotted);
            if self.at_keyword(Keyword::Fetch) {
                self.advance();
            }
            let alias = if matches!(self.peek(), Token::Ident(_)) || self.at_keyword(Keyword::As) {
                if self.at_keyword(Keyword::As) {
                    self.advance();
                }
                self.expect_ident()?
            } else {
                path.last().cloned().unwrap_or_default()
            };

            let (_, field) = self.entity.resolve_path(&path, self.entities).ok_or_else(|| ParseError::UnknownProperty(path.join(".")))?;
            let rel = field.relationship.as_ref().ok_or_else(|| ParseError::UnknownProperty(path.join(".")))?;

            self.aliases.insert(alias, path.clone());
            joins.push(JoinDescriptor {
                path,
                target_entity: rel.target_entity.clone(),
                join_column: rel.fk_column.clone(),
                referenced_column: None,
                kind,
            });
        }
        Ok(joins)
    }

    fn parse_select(&mut self, ctx: &QueryContext) -> Result<LogicalQuery, ParseError> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = if self.at_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else {
            false
        };

        let is_count = if self.at_keyword(Keyword::Count) {
            self.advance();
            if self.peek() == &Token::LParen {
                self.advance();
                // COUNT(*) or COUNT(alias)
                if self.peek() != &Token::Star {
                    self.expect_ident()?;
                } else {
                    self.advance();
                }
                if self.peek() != &Token::RParen {
                    return Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()));
                }
                self.advance();
            }
            true
        } else {
            false
        };

        // A bare entity alias (`SELECT u`) selects the whole row and isn't
        // a projection. Anything with a dotted path, an `AS`, or a comma is
        // a projection list, which requires an alias per item (spec.md
        // §4.6 "projection requires aliases"). Path resolution is deferred
        // until the root alias is registered below.
        let mut raw_projection: Option<Vec<(String, String)>> = None;
        if !is_count && matches!(self.peek(), Token::Ident(_)) {
            let first = self.expect_ident()?;
            if self.at_keyword(Keyword::As) || self.peek() == &Token::Comma || first.contains('.') {
                let mut items = Vec::new();
                let mut current = first;
                loop {
                    if !self.at_keyword(Keyword::As) {
                        return Err(ParseError::ProjectionRequiresAliases);
                    }
                    self.advance();
                    let alias = self.expect_ident()?;
                    items.push((current, alias));
                    if self.peek() == &Token::Comma {
                        self.advance();
                        current = self.expect_ident()?;
                        continue;
                    }
                    break;
                }
                raw_projection = Some(items);
            }
        }

        self.expect_keyword(Keyword::From)?;
        let _entity_name = self.expect_ident()?;
        let root_alias = self.expect_ident()?;
        self.aliases.insert(root_alias, Vec::new());

        let projection = raw_projection.map(|items| Projection {
            target_type: None,
            items: items.into_iter().map(|(dotted, alias)| ProjectionItem { path: self.resolve_path(&dotted), alias }).collect(),
        });

        let joins = self.parse_joins()?;
        let conditions = self.parse_where_clause()?;

        if self.at_keyword(Keyword::Group) {
            return Err(ParseError::GroupByHavingNotSupported);
        }
        if self.at_keyword(Keyword::Having) {
            return Err(ParseError::GroupByHavingNotSupported);
        }
        let order_by = self.parse_order_by()?;

        let (op, return_kind) = if is_count {
            if ctx.return_arity != ReturnArity::Numeric {
                return Err(ParseError::CountRequiresNumericReturn);
            }
            (OpCode::Count, ReturnKind::Count)
        } else {
            if ctx.return_arity == ReturnArity::Numeric {
                return Err(ParseError::SelectRequiresNonNumericReturn);
            }
            (OpCode::Find, ReturnKind::List)
        };

        let mut query = LogicalQuery::new(op, return_kind);
        query.conditions = conditions;
        query.joins = joins;
        query.order_by = order_by;
        query.distinct = distinct;
        query.projection = projection;
        Ok(query)
    }

    fn parse_update(&mut self, ctx: &QueryContext) -> Result<LogicalQuery, ParseError> {
        if !ctx.modifying {
            return Err(ParseError::MissingModifyingMarker);
        }
        if !matches!(ctx.return_arity, ReturnArity::Void | ReturnArity::Numeric) {
            return Err(ParseError::InvalidModifyingReturnType);
        }
        self.expect_keyword(Keyword::Update)?;
        let _entity_name = self.expect_ident()?;
        let alias = self.expect_ident()?;
        self.aliases.insert(alias, Vec::new());
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = Vec::new();
        loop {
            let dotted = self.expect_ident()?;
            let path = self.resolve_path(&dotted);
            if path == [self.entity.id_field.clone()] {
                return Err(ParseError::UpdateAssignsId(self.entity.id_field.clone()));
            }
            self.expect_keyword_eq()?;
            let value = self.parse_value()?;
            assignments.push(UpdateAssignment { path, value });
            if self.peek() == &Token::Comma {
                self.advance();
                continue;
            }
            break;
        }
        let conditions = self.parse_where_clause()?;

        let mut query = LogicalQuery::new(OpCode::Update, ReturnKind::Modifying);
        query.conditions = conditions;
        query.update_assignments = assignments;
        Ok(query)
    }

    fn expect_keyword_eq(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::Eq {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken(format!("{:?}", self.peek()), self.pos_offset()))
        }
    }

    fn parse_delete(&mut self, ctx: &QueryContext) -> Result<LogicalQuery, ParseError> {
        if !ctx.modifying {
            return Err(ParseError::MissingModifyingMarker);
        }
        if !matches!(ctx.return_arity, ReturnArity::Void | ReturnArity::Numeric) {
            return Err(ParseError::InvalidModifyingReturnType);
        }
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let _entity_name = self.expect_ident()?;
        let alias = self.expect_ident()?;
        self.aliases.insert(alias, Vec::new());
        let conditions = self.parse_where_clause()?;

        let mut query = LogicalQuery::new(OpCode::Delete, ReturnKind::Modifying);
        query.conditions = conditions;
        Ok(query)
    }
}

fn negate_operator(op: Operator) -> Result<Operator, ParseError> {
    Ok(match op {
        Operator::Eq => Operator::Ne,
        Operator::Ne => Operator::Eq,
        Operator::Gt => Operator::Le,
        Operator::Le => Operator::Gt,
        Operator::Ge => Operator::Lt,
        Operator::Lt => Operator::Ge,
        Operator::Like => Operator::NotLike,
        Operator::NotLike => Operator::Like,
        Operator::In => Operator::NotIn,
        Operator::NotIn => Operator::In,
        Operator::IsNull => Operator::IsNotNull,
        Operator::IsNotNull => Operator::IsNull,
        _ => return Err(ParseError::UnsupportedNegation),
    })
}

fn push_not(expr: BoolExpr) -> Result<BoolExpr, ParseError> {
    Ok(match expr {
        BoolExpr::Not(inner) => match *inner {
            BoolExpr::Not(inner2) => push_not(*inner2)?,
            BoolExpr::And(list) => BoolExpr::Or(list.into_iter().map(|x| push_not(BoolExpr::Not(Box::new(x)))).collect::<Result<_, _>>()?),
            BoolExpr::Or(list) => BoolExpr::And(list.into_iter().map(|x| push_not(BoolExpr::Not(Box::new(x)))).collect::<Result<_, _>>()?),
            BoolExpr::Leaf(l) => BoolExpr::Leaf(CondLeaf { path: l.path, operator: negate_operator(l.operator)?, args: l.args, case_ignore: l.case_ignore }),
        },
        BoolExpr::And(list) => BoolExpr::And(list.into_iter().map(push_not).collect::<Result<_, _>>()?),
        BoolExpr::Or(list) => BoolExpr::Or(list.into_iter().map(push_not).collect::<Result<_, _>>()?),
        BoolExpr::Leaf(l) => BoolExpr::Leaf(l),
    })
}

fn to_dnf(expr: BoolExpr) -> Result<Vec<Vec<CondLeaf>>, ParseError> {
    match expr {
        BoolExpr::Leaf(l) => Ok(vec![vec![l]]),
        BoolExpr::Not(inner) => to_dnf(push_not(BoolExpr::Not(inner))?),
        BoolExpr::Or(list) => {
            let mut out = Vec::new();
            for item in list {
                out.extend(to_dnf(item)?);
            }
            Ok(out)
        }
        BoolExpr::And(list) => {
            let mut acc = vec![Vec::new()];
            for item in list {
                let item_dnf = to_dnf(item)?;
                let mut next = Vec::with_capacity(acc.len() * item_dnf.len());
                for existing in &acc {
                    for group in &item_dnf {
                        let mut combined = existing.clone();
                        combined.extend(group.iter().map(|l| CondLeaf { path: l.path.clone(), operator: l.operator, args: l.args.clone(), case_ignore: l.case_ignore }));
                        next.push(combined);
                    }
                }
                acc = next;
            }
            Ok(acc)
        }
    }
}

fn flatten(groups: Vec<Vec<CondLeaf>>) -> Vec<Condition> {
    let mut conditions = Vec::new();
    let n_groups = groups.len();
    for (gi, group) in groups.into_iter().enumerate() {
        let n = group.len();
        for (ci, leaf) in group.into_iter().enumerate() {
            let mut condition = Condition::new(leaf.path, leaf.operator, leaf.args);
            condition.case_ignore = leaf.case_ignore;
            condition.next = if ci + 1 < n {
                Combinator::And
            } else if gi + 1 < n_groups {
                Combinator::Or
            } else {
                Combinator::None
            };
            conditions.push(condition);
        }
    }
    conditions
}
