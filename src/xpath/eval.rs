//! Selector evaluation over a dom_query tree.

use std::collections::{HashMap, HashSet};

use dom_query::{NodeData, NodeId, NodeRef};

use super::parser::{ArithOp, Axis, CmpOp, Expr, Function, NodeTest, Step};

/// One selected item: a tree node or an attribute of an element.
#[derive(Clone)]
pub enum Item<'a> {
    Node(NodeRef<'a>),
    Attribute {
        owner: NodeRef<'a>,
        index: usize,
        name: String,
        value: String,
    },
}

impl<'a> Item<'a> {
    /// XPath string value: descendant text for nodes, the value for attributes.
    #[must_use]
    pub fn string_value(&self) -> String {
        match self {
            Self::Node(node) if node.is_comment() => node
                .query(|n| match &n.data {
                    NodeData::Comment { contents } => contents.to_string(),
                    _ => String::new(),
                })
                .unwrap_or_default(),
            Self::Node(node) => node.text().to_string(),
            Self::Attribute { value, .. } => value.clone(),
        }
    }

    /// The tree node, if this item is one.
    #[must_use]
    pub fn node(&self) -> Option<NodeRef<'a>> {
        match self {
            Self::Node(node) => Some(*node),
            Self::Attribute { .. } => None,
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Node(node) if node.is_element() => {
                node.node_name().map(|n| n.to_string()).unwrap_or_default()
            }
            Self::Node(_) => String::new(),
            Self::Attribute { name, .. } => name.clone(),
        }
    }

    /// Identity used for de-duplication: attributes sort right after their owner.
    fn key(&self) -> (NodeId, usize) {
        match self {
            Self::Node(node) => (node.id, 0),
            Self::Attribute { owner, index, .. } => (owner.id, index + 1),
        }
    }
}

pub(crate) enum Value<'a> {
    Nodes(Vec<Item<'a>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value<'_> {
    fn to_bool(&self) -> bool {
        match self {
            Self::Nodes(items) => !items.is_empty(),
            Self::Str(s) => !s.is_empty(),
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
        }
    }

    fn to_str(&self) -> String {
        match self {
            Self::Nodes(items) => items.first().map(Item::string_value).unwrap_or_default(),
            Self::Str(s) => s.clone(),
            Self::Num(n) => number_to_string(*n),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn to_num(&self) -> f64 {
        match self {
            Self::Num(n) => *n,
            Self::Bool(b) => f64::from(u8::from(*b)),
            other => string_to_number(&other.to_str()),
        }
    }
}

/// XPath `round()`: halves go toward positive infinity.
fn round_half_up(n: f64) -> f64 {
    if n.is_finite() { (n + 0.5).floor() } else { n }
}

/// XPath `substring()` over characters, with 1-based rounded bounds.
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = round_half_up(start);
    let end = length.map_or(f64::INFINITY, |len| first + round_half_up(len));
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let position = (i + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

fn string_to_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

type EvalResult<T> = Result<T, String>;

#[derive(Clone)]
struct Context<'a> {
    item: Item<'a>,
    position: usize,
    size: usize,
}

/// Evaluates compiled expressions against one document.
pub(crate) struct Evaluator<'a> {
    root: NodeRef<'a>,
    order: HashMap<NodeId, usize>,
}

impl<'a> Evaluator<'a> {
    /// Prepare evaluation for the document that contains `node`.
    pub(crate) fn new(node: NodeRef<'a>) -> Self {
        let mut root = node;
        while let Some(parent) = root.parent() {
            root = parent;
        }

        let mut order = HashMap::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            order.insert(current.id, order.len());
            stack.extend(current.children().into_iter().rev());
        }

        Self { root, order }
    }

    /// Evaluate `expr` with `context` as the context node; the result must be a node-set.
    pub(crate) fn select(&self, expr: &Expr, context: NodeRef<'a>) -> EvalResult<Vec<Item<'a>>> {
        let ctx = Context {
            item: Item::Node(context),
            position: 1,
            size: 1,
        };
        match self.eval(expr, &ctx)? {
            Value::Nodes(items) => Ok(items),
            _ => Err("expression does not select nodes".to_string()),
        }
    }

    fn eval(&self, expr: &Expr, ctx: &Context<'a>) -> EvalResult<Value<'a>> {
        let value = match expr {
            Expr::Or(l, r) => Value::Bool(self.eval(l, ctx)?.to_bool() || self.eval(r, ctx)?.to_bool()),
            Expr::And(l, r) => Value::Bool(self.eval(l, ctx)?.to_bool() && self.eval(r, ctx)?.to_bool()),
            Expr::Compare(op, l, r) => {
                let (l, r) = (self.eval(l, ctx)?, self.eval(r, ctx)?);
                Value::Bool(compare(*op, &l, &r))
            }
            Expr::Arith(op, l, r) => {
                let (l, r) = (self.eval(l, ctx)?.to_num(), self.eval(r, ctx)?.to_num());
                Value::Num(match op {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                    ArithOp::Mod => l % r,
                })
            }
            Expr::Negate(inner) => Value::Num(-self.eval(inner, ctx)?.to_num()),
            Expr::Union(l, r) => {
                let (Value::Nodes(mut left), Value::Nodes(right)) = (self.eval(l, ctx)?, self.eval(r, ctx)?)
                else {
                    return Err("union operands must be node-sets".to_string());
                };
                left.extend(right);
                Value::Nodes(self.normalize(left))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    vec![Item::Node(self.root)]
                } else {
                    vec![ctx.item.clone()]
                };
                Value::Nodes(self.apply_steps(start, steps)?)
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let Value::Nodes(items) = self.eval(primary, ctx)? else {
                    return Err("predicates and paths need a node-set".to_string());
                };
                let mut items = self.normalize(items);
                for predicate in predicates {
                    items = self.filter(items, predicate)?;
                }
                Value::Nodes(self.apply_steps(items, steps)?)
            }
            Expr::Literal(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Call(function, args) => self.call(*function, args, ctx)?,
        };
        Ok(value)
    }

    fn apply_steps(&self, mut items: Vec<Item<'a>>, steps: &[Step]) -> EvalResult<Vec<Item<'a>>> {
        for step in steps {
            let mut next = Vec::new();
            for item in &items {
                let mut candidates: Vec<Item<'a>> = axis_items(item, step.axis)
                    .into_iter()
                    .filter(|candidate| matches_test(candidate, step.axis, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate)?;
                }
                next.extend(candidates);
            }
            items = self.normalize(next);
        }
        Ok(items)
    }

    /// Keep the items for which `predicate` holds, in their current order.
    fn filter(&self, items: Vec<Item<'a>>, predicate: &Expr) -> EvalResult<Vec<Item<'a>>> {
        let size = items.len();
        let mut kept = Vec::with_capacity(size);
        for (i, item) in items.into_iter().enumerate() {
            let ctx = Context {
                item,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, &ctx)? {
                Value::Num(n) => n == ctx.position as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(ctx.item);
            }
        }
        Ok(kept)
    }

    /// Sort into document order and drop duplicates.
    fn normalize(&self, items: Vec<Item<'a>>) -> Vec<Item<'a>> {
        let mut seen = HashSet::new();
        let mut unique: Vec<Item<'a>> = items.into_iter().filter(|item| seen.insert(item.key())).collect();
        unique.sort_by_key(|item| {
            let (id, slot) = item.key();
            (self.order.get(&id).copied().unwrap_or(usize::MAX), slot)
        });
        unique
    }

    fn call(&self, function: Function, args: &[Expr], ctx: &Context<'a>) -> EvalResult<Value<'a>> {
        let arg = |i: usize| -> EvalResult<Value<'a>> {
            match args.get(i) {
                Some(expr) => self.eval(expr, ctx),
                None => Ok(Value::Nodes(vec![ctx.item.clone()])),
            }
        };

        let value = match function {
            Function::Last => Value::Num(ctx.size as f64),
            Function::Position => Value::Num(ctx.position as f64),
            Function::Count => match arg(0)? {
                Value::Nodes(items) => Value::Num(items.len() as f64),
                _ => return Err("count() needs a node-set".to_string()),
            },
            Function::String => Value::Str(arg(0)?.to_str()),
            Function::Concat => {
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&arg(i)?.to_str());
                }
                Value::Str(out)
            }
            Function::Contains => Value::Bool(arg(0)?.to_str().contains(&arg(1)?.to_str())),
            Function::StartsWith => Value::Bool(arg(0)?.to_str().starts_with(&arg(1)?.to_str())),
            Function::EndsWith => Value::Bool(arg(0)?.to_str().ends_with(&arg(1)?.to_str())),
            Function::NormalizeSpace => {
                Value::Str(arg(0)?.to_str().split_whitespace().collect::<Vec<_>>().join(" "))
            }
            Function::StringLength => Value::Num(arg(0)?.to_str().chars().count() as f64),
            Function::Translate => {
                let source = arg(0)?.to_str();
                let from: Vec<char> = arg(1)?.to_str().chars().collect();
                let to: Vec<char> = arg(2)?.to_str().chars().collect();
                let translated = source
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect();
                Value::Str(translated)
            }
            Function::Substring => {
                let source = arg(0)?.to_str();
                let start = arg(1)?.to_num();
                let length = if args.len() > 2 { Some(arg(2)?.to_num()) } else { None };
                Value::Str(substring(&source, start, length))
            }
            Function::SubstringBefore => {
                let (source, needle) = (arg(0)?.to_str(), arg(1)?.to_str());
                Value::Str(source.find(&needle).map(|i| source[..i].to_string()).unwrap_or_default())
            }
            Function::SubstringAfter => {
                let (source, needle) = (arg(0)?.to_str(), arg(1)?.to_str());
                Value::Str(
                    source
                        .find(&needle)
                        .map(|i| source[i + needle.len()..].to_string())
                        .unwrap_or_default(),
                )
            }
            Function::Not => Value::Bool(!arg(0)?.to_bool()),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Boolean => Value::Bool(arg(0)?.to_bool()),
            Function::Number => Value::Num(arg(0)?.to_num()),
            Function::Sum => match arg(0)? {
                Value::Nodes(items) => Value::Num(items.iter().map(|i| string_to_number(&i.string_value())).sum()),
                _ => return Err("sum() needs a node-set".to_string()),
            },
            Function::Floor => Value::Num(arg(0)?.to_num().floor()),
            Function::Ceiling => Value::Num(arg(0)?.to_num().ceil()),
            Function::Round => Value::Num(round_half_up(arg(0)?.to_num())),
            Function::Lang => Value::Bool(lang_matches(&ctx.item, &arg(0)?.to_str())),
            Function::Id => {
                let tokens = match arg(0)? {
                    Value::Nodes(items) => items.iter().map(Item::string_value).collect::<Vec<_>>().join(" "),
                    other => other.to_str(),
                };
                Value::Nodes(self.elements_by_id(&tokens))
            }
            Function::Name | Function::LocalName => match arg(0)? {
                Value::Nodes(items) => Value::Str(items.first().map(Item::name).unwrap_or_default()),
                _ => return Err("name() needs a node-set".to_string()),
            },
            // Parsed HTML elements carry no namespace.
            Function::NamespaceUri => match arg(0)? {
                Value::Nodes(_) => Value::Str(String::new()),
                _ => return Err("namespace-uri() needs a node-set".to_string()),
            },
        };
        Ok(value)
    }

    /// Elements whose `id` is one of the whitespace-separated `tokens`, in document order.
    fn elements_by_id(&self, tokens: &str) -> Vec<Item<'a>> {
        let wanted: HashSet<&str> = tokens.split_whitespace().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        descendants(self.root)
            .into_iter()
            .filter(|node| node.is_element() && node.attr("id").is_some_and(|id| wanted.contains(&*id)))
            .map(Item::Node)
            .collect()
    }
}

/// `lang()`: the nearest `xml:lang` or `lang` attribute equals `wanted` or starts with `wanted-`.
fn lang_matches(item: &Item<'_>, wanted: &str) -> bool {
    let start = match item {
        Item::Node(node) => *node,
        Item::Attribute { owner, .. } => *owner,
    };
    let declared = std::iter::successors(Some(start), NodeRef::parent)
        .filter(NodeRef::is_element)
        .find_map(|node| node.attr("xml:lang").or_else(|| node.attr("lang")));
    let Some(declared) = declared else {
        return false;
    };
    let declared = declared.to_ascii_lowercase();
    let wanted = wanted.to_ascii_lowercase();
    declared == wanted || declared.strip_prefix(&wanted).is_some_and(|rest| rest.starts_with('-'))
}

fn axis_items<'a>(item: &Item<'a>, axis: Axis) -> Vec<Item<'a>> {
    let node = match item {
        Item::Node(node) => *node,
        Item::Attribute { owner, .. } => {
            return match axis {
                Axis::SelfAxis => vec![item.clone()],
                Axis::Parent => vec![Item::Node(*owner)],
                Axis::Ancestor | Axis::AncestorOrSelf => {
                    let mut out = if axis == Axis::AncestorOrSelf { vec![item.clone()] } else { Vec::new() };
                    out.push(Item::Node(*owner));
                    out.extend(ancestors(*owner).into_iter().map(Item::Node));
                    out
                }
                // An attribute sits between its owner and the owner's children.
                Axis::Following => {
                    let mut out = descendants(*owner);
                    out.extend(following(*owner));
                    out.into_iter().map(Item::Node).collect()
                }
                Axis::Preceding => preceding(*owner).into_iter().map(Item::Node).collect(),
                _ => Vec::new(),
            };
        }
    };

    let nodes = match axis {
        Axis::Child => node.children(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut out = vec![node];
            out.extend(descendants(node));
            out
        }
        Axis::SelfAxis => vec![node],
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node];
            out.extend(ancestors(node));
            out
        }
        Axis::FollowingSibling => std::iter::successors(node.next_sibling(), NodeRef::next_sibling).collect(),
        Axis::PrecedingSibling => std::iter::successors(node.prev_sibling(), NodeRef::prev_sibling).collect(),
        Axis::Following => following(node),
        Axis::Preceding => preceding(node),
        // HTML trees have no namespace nodes.
        Axis::Namespace => Vec::new(),
        Axis::Attribute => {
            if !node.is_element() {
                return Vec::new();
            }
            return node
                .attrs()
                .iter()
                .enumerate()
                .map(|(index, attr)| Item::Attribute {
                    owner: node,
                    index,
                    name: attr.name.local.to_string(),
                    value: attr.value.to_string(),
                })
                .collect();
        }
    };
    nodes.into_iter().map(Item::Node).collect()
}

/// Ancestors, nearest first.
fn ancestors(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    std::iter::successors(node.parent(), NodeRef::parent).collect()
}

/// Nodes after `node` in document order, excluding its descendants.
fn following(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    for current in std::iter::successors(Some(node), NodeRef::parent) {
        for sibling in std::iter::successors(current.next_sibling(), NodeRef::next_sibling) {
            out.push(sibling);
            out.extend(descendants(sibling));
        }
    }
    out
}

/// Nodes before `node` in document order, excluding its ancestors; nearest first.
fn preceding(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    for current in std::iter::successors(Some(node), NodeRef::parent) {
        for sibling in std::iter::successors(current.prev_sibling(), NodeRef::prev_sibling) {
            out.extend(descendants(sibling).into_iter().rev());
            out.push(sibling);
        }
    }
    out
}

/// Descendants in document order, without recursion.
fn descendants(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeRef<'_>> = node.children().into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        out.push(current);
        stack.extend(current.children().into_iter().rev());
    }
    out
}

fn matches_test(item: &Item<'_>, axis: Axis, test: &NodeTest) -> bool {
    match item {
        Item::Attribute { name, .. } => match test {
            NodeTest::Any => true,
            // Attributes are the principal node type of the attribute axis only.
            NodeTest::Wildcard => axis == Axis::Attribute,
            NodeTest::Name(expected) => axis == Axis::Attribute && name.eq_ignore_ascii_case(expected),
            NodeTest::Text | NodeTest::Comment | NodeTest::ProcessingInstruction(_) => false,
        },
        Item::Node(node) => match test {
            NodeTest::Any => true,
            NodeTest::Text => node.is_text(),
            NodeTest::Comment => node.is_comment(),
            NodeTest::ProcessingInstruction(target) => node
                .query(|n| match &n.data {
                    NodeData::ProcessingInstruction { target: actual, .. } => {
                        target.as_deref().is_none_or(|t| t == &**actual)
                    }
                    _ => false,
                })
                .unwrap_or(false),
            NodeTest::Wildcard => axis != Axis::Attribute && node.is_element(),
            NodeTest::Name(expected) => {
                axis != Axis::Attribute
                    && node.is_element()
                    && node.node_name().is_some_and(|n| n.eq_ignore_ascii_case(expected))
            }
        },
    }
}

fn compare(op: CmpOp, left: &Value<'_>, right: &Value<'_>) -> bool {
    match (left, right) {
        (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
            let a = Value::Str(a.string_value());
            r.iter().any(|b| compare_atoms(op, &a, &Value::Str(b.string_value())))
        }),
        (Value::Nodes(nodes), Value::Bool(b)) => compare_atoms(op, &Value::Bool(!nodes.is_empty()), &Value::Bool(*b)),
        (Value::Bool(b), Value::Nodes(nodes)) => compare_atoms(op, &Value::Bool(*b), &Value::Bool(!nodes.is_empty())),
        (Value::Nodes(nodes), other) => nodes
            .iter()
            .any(|n| compare_atoms(op, &Value::Str(n.string_value()), other)),
        (other, Value::Nodes(nodes)) => nodes
            .iter()
            .any(|n| compare_atoms(op, other, &Value::Str(n.string_value()))),
        (l, r) => compare_atoms(op, l, r),
    }
}

fn compare_atoms(op: CmpOp, left: &Value<'_>, right: &Value<'_>) -> bool {
    match op {
        CmpOp::Eq | CmpOp::NotEq => {
            let equal = match (left, right) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => left.to_bool() == right.to_bool(),
                (Value::Num(_), _) | (_, Value::Num(_)) => left.to_num() == right.to_num(),
                _ => left.to_str() == right.to_str(),
            };
            equal == (op == CmpOp::Eq)
        }
        CmpOp::Lt => left.to_num() < right.to_num(),
        CmpOp::LtEq => left.to_num() <= right.to_num(),
        CmpOp::Gt => left.to_num() > right.to_num(),
        CmpOp::GtEq => left.to_num() >= right.to_num(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.5), "-0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert!(string_to_number("abc").is_nan());
    }

    #[test]
    fn test_substring_rounding() {
        assert_eq!(substring("12345", 2.0, Some(3.0)), "234");
        assert_eq!(substring("12345", 1.5, Some(2.6)), "234");
        assert_eq!(substring("12345", 0.0, Some(3.0)), "12");
        assert_eq!(substring("12345", 2.0, None), "2345");
        assert_eq!(substring("12345", f64::NAN, Some(3.0)), "");
        assert_eq!(substring("12345", 1.0, Some(f64::NAN)), "");
        assert_eq!(substring("12345", -42.0, Some(f64::INFINITY)), "12345");
        assert_eq!(substring("12345", f64::NEG_INFINITY, Some(f64::INFINITY)), "");
        assert_eq!(substring("héllo", 2.0, Some(2.0)), "él");
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(1.4), 1.0);
        assert!(round_half_up(f64::NAN).is_nan());
        assert_eq!(round_half_up(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_compare_atoms() {
        assert!(compare_atoms(CmpOp::Eq, &Value::Str("1".into()), &Value::Num(1.0)));
        assert!(compare_atoms(CmpOp::NotEq, &Value::Str("a".into()), &Value::Str("b".into())));
        assert!(compare_atoms(CmpOp::Eq, &Value::Str("x".into()), &Value::Bool(true)));
        assert!(compare_atoms(CmpOp::Lt, &Value::Num(1.0), &Value::Str("2".into())));
        assert!(!compare_atoms(CmpOp::Gt, &Value::Num(f64::NAN), &Value::Num(0.0)));
    }
}
