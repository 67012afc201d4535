//! Reaction network. Parses reaction lines into directed edges and answers
//! connectivity questions (weak components, sources, sinks).
//!
//! Reactions with two reactants or two products are routed through a dummy
//! reaction node named `r<line index>`. Dummy nodes never appear in source or
//! sink lists.

use crate::domain::entities::{Edge, Relation, TerminalNodes};
use crate::domain::notation::strip_parameters;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Keyword detection, checked in order. The first hit decides the relation.
static RELATION_KEYWORDS: LazyLock<Vec<(Regex, Relation)>> = LazyLock::new(|| {
    [
        (r"\bdimerizes\b", Relation::Dimerize),
        (r"\bbinds\b", Relation::Bind),
        (r"\bdissociates\b", Relation::Dissociate),
        (r"\bdephosphorylates\b", Relation::Dephosphorylate),
        (r"\bphosphorylates\b", Relation::Phosphorylate),
        (r"\bis phosphorylated\b", Relation::IsPhosphorylated),
        (r"\bis dephosphorylated\b", Relation::IsDephosphorylated),
        (r"\btranscribes\b", Relation::Transcribe),
        (r"\bsynthesizes\b", Relation::Synthesize),
        (r"\bis synthesized\b", Relation::IsSynthesized),
        (r"\bdegrades\b", Relation::Degrade),
        (r"\bis degraded\b", Relation::IsDegraded),
        (r"\btranslocates\b|\btranslocated\b", Relation::Translocate),
        (r"\bactivates\b", Relation::Activate),
        (r"\binhibits\b", Relation::Inhibit),
    ]
    .into_iter()
    .map(|(p, r)| (Regex::new(p).expect("relation keyword pattern"), r))
    .collect()
});

static DIMER_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)\s*dimerize").expect("dimer pattern"));

static TRANSLOCATE_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s*(translocates|is translocated)").expect("translocate pattern")
});

/// Name of the dummy reaction node for line `idx`.
pub fn dummy_node(idx: usize) -> String {
    format!("r{}", idx)
}

/// True for dummy reaction node names (`r` followed by digits only).
pub fn is_dummy_node(name: &str) -> bool {
    name.strip_prefix('r')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn verb_of(relation: Relation) -> Option<&'static str> {
    match relation {
        Relation::Bind => Some("binds"),
        Relation::Phosphorylate => Some("phosphorylates"),
        Relation::Dephosphorylate => Some("dephosphorylates"),
        Relation::IsPhosphorylated => Some("is phosphorylated"),
        Relation::IsDephosphorylated => Some("is dephosphorylated"),
        Relation::Transcribe => Some("transcribes"),
        Relation::Synthesize => Some("synthesizes"),
        Relation::Degrade => Some("degrades"),
        Relation::Activate => Some("activates"),
        Relation::Inhibit => Some("inhibits"),
        _ => None,
    }
}

fn detect_relation(text: &str) -> Option<Relation> {
    RELATION_KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, r)| *r)
        .or_else(|| (text.contains("<-->") || text.contains("-->")).then_some(Relation::StateTransition))
}

/// Splits `text` once on `sep`, trimming both halves.
fn split_pair<'a>(text: &'a str, sep: &str) -> (&'a str, &'a str) {
    match text.split_once(sep) {
        Some((l, r)) => (l.trim(), r.trim()),
        None => (text.trim(), ""),
    }
}

fn non_empty(parts: impl IntoIterator<Item = String>) -> Vec<String> {
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn edge(from: &str, to: &str, relation: Relation, parameters: &str) -> Edge {
    Edge {
        from: from.to_string(),
        to: to.to_string(),
        relation,
        parameters: parameters.to_string(),
    }
}

/// Parses one reaction line into edges. Returns `None` for lines whose
/// reaction kind or participants cannot be recognised.
pub fn parse_reaction_line(line: &str, idx: usize) -> Option<Vec<Edge>> {
    let parameters = line.split_once('|').map(|(_, p)| p.trim()).unwrap_or("");
    let text = strip_parameters(line);

    if let Some(rest) = text.strip_prefix("@rxn") {
        return parse_rate_law_line(rest, idx, parameters);
    }

    let Some(relation) = detect_relation(text) else {
        info!(line = %text, "unknown reaction encountered");
        return None;
    };

    let (left, right): (String, String) = if text.contains("<-->") {
        let (l, r) = split_pair(text, "<-->");
        (l.to_string(), r.to_string())
    } else if text.contains("-->") {
        let (l, r) = split_pair(text, "-->");
        (l.to_string(), r.to_string())
    } else if text.contains("dissociates to") {
        let (l, r) = split_pair(text, "dissociates to");
        (l.to_string(), r.to_string())
    } else {
        match relation {
            Relation::Transcribe
            | Relation::Synthesize
            | Relation::Degrade
            | Relation::Activate
            | Relation::Inhibit => {
                let verb = verb_of(relation).unwrap_or_default();
                let (l, r) = split_pair(text, verb);
                (l.to_string(), r.to_string())
            }
            Relation::IsSynthesized => {
                let (species, _) = split_pair(text, " is ");
                (dummy_node(idx), species.to_string())
            }
            Relation::IsDegraded => {
                let (species, _) = split_pair(text, " is ");
                (species.to_string(), dummy_node(idx))
            }
            _ => {
                info!(line = %text, "reaction participants could not be split");
                return None;
            }
        }
    };

    let (reactants, products): (Vec<String>, Vec<String>) = match relation {
        Relation::Bind | Relation::Phosphorylate | Relation::Dephosphorylate => {
            let verb = verb_of(relation).unwrap_or_default();
            let reactants = non_empty(left.split(verb).map(|p| p.trim().to_string()));
            (reactants, vec![right.clone()])
        }
        Relation::IsPhosphorylated | Relation::IsDephosphorylated => {
            let verb = verb_of(relation).unwrap_or_default();
            let (subject, _) = split_pair(&left, verb);
            (non_empty([subject.to_string()]), vec![right.clone()])
        }
        Relation::Dissociate => {
            let products = non_empty(right.split(" and ").map(|p| p.trim().to_string()));
            (vec![left.clone()], products)
        }
        Relation::Dimerize => {
            let subject = DIMER_SUBJECT
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| left.clone());
            (vec![subject], vec![right.clone()])
        }
        Relation::Translocate => {
            let subject = TRANSLOCATE_SUBJECT
                .captures(&left)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| left.clone());
            (vec![subject], vec![right.clone()])
        }
        Relation::Transcribe
        | Relation::Synthesize
        | Relation::Activate
        | Relation::Inhibit
        | Relation::Degrade => {
            let verb = verb_of(relation).unwrap_or_default();
            let (l, r) = split_pair(text, verb);
            (vec![l.to_string()], non_empty([r.to_string()]))
        }
        Relation::IsSynthesized => (vec![], vec![right.clone()]),
        Relation::IsDegraded => (vec![left.clone()], vec![]),
        Relation::StateTransition | Relation::Rxn => (vec![left.clone()], vec![right.clone()]),
    };

    let rows = match (reactants.as_slice(), products.as_slice()) {
        ([r], [p]) => vec![edge(r, p, relation, parameters)],
        ([a, b], [p]) if relation == Relation::Bind => {
            let hub = dummy_node(idx);
            vec![
                edge(a, &hub, relation, parameters),
                edge(b, &hub, relation, parameters),
                edge(&hub, p, relation, parameters),
            ]
        }
        ([enzyme, substrate], [p]) => {
            let follow_up = if relation == Relation::Dephosphorylate {
                Relation::IsDephosphorylated
            } else {
                Relation::IsPhosphorylated
            };
            vec![
                edge(enzyme, substrate, relation, parameters),
                edge(substrate, p, follow_up, parameters),
            ]
        }
        ([r], [p1, p2]) => vec![
            edge(r, p1, relation, parameters),
            edge(r, p2, relation, parameters),
        ],
        ([a, b], [p1, p2]) => {
            let hub = dummy_node(idx);
            vec![
                edge(a, &hub, relation, parameters),
                edge(b, &hub, relation, parameters),
                edge(&hub, p1, relation, parameters),
                edge(&hub, p2, relation, parameters),
            ]
        }
        _ => {
            if left.is_empty() || right.is_empty() {
                info!(line = %text, "reaction is missing a reactant or product");
                return None;
            }
            vec![edge(&left, &right, relation, parameters)]
        }
    };

    Some(rows)
}

/// `@rxn LHS --> RHS : rate`. Species on each side are separated by `+`.
fn parse_rate_law_line(rest: &str, idx: usize, parameters: &str) -> Option<Vec<Edge>> {
    let reaction = rest.split_once(':').map(|(r, _)| r).unwrap_or(rest);
    let sep = if reaction.contains("<-->") { "<-->" } else { "-->" };
    let Some((lhs, rhs)) = reaction.split_once(sep) else {
        info!(line = %rest, "rate-law line without arrow");
        return None;
    };
    let species = |side: &str| non_empty(side.split('+').map(|s| s.trim().to_string()));
    let reactants = species(lhs);
    let products = species(rhs);

    let rows = match (reactants.as_slice(), products.as_slice()) {
        ([r], [p]) => vec![edge(r, p, Relation::Rxn, parameters)],
        ([], []) => return None,
        _ => {
            let hub = dummy_node(idx);
            reactants
                .iter()
                .map(|r| edge(r, &hub, Relation::Rxn, parameters))
                .chain(products.iter().map(|p| edge(&hub, p, Relation::Rxn, parameters)))
                .collect()
        }
    };
    Some(rows)
}

/// Parses every line; unrecognised lines contribute no edges.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<Edge> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| parse_reaction_line(line.as_ref(), idx))
        .flatten()
        .collect()
}

/// Sources and sinks of one weakly connected subnetwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnetwork {
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
}

/// Result of a continuity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuity {
    pub connected: bool,
    /// One entry when connected, one per weak component otherwise.
    pub subnetworks: Vec<Subnetwork>,
}

/// Directed graph over species and dummy reaction nodes. Parallel edges collapse.
#[derive(Debug, Clone, Default)]
pub struct ReactionNetwork {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
}

impl ReactionNetwork {
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut net = Self::default();
        for e in edges {
            net.add_edge(&e.from, &e.to);
        }
        net
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::from_edges(&parse_lines(lines))
    }

    fn node_id(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.succ.push(Vec::new());
        self.pred.push(Vec::new());
        id
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let u = self.node_id(from);
        let v = self.node_id(to);
        if self.edges.insert((u, v)) {
            self.succ[u].push(v);
            self.pred[v].push(u);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Dummy nodes with no inbound or no outbound edge are dropped; everything else stays.
    fn alive_mask(&self) -> Vec<bool> {
        (0..self.nodes.len())
            .map(|i| {
                !(is_dummy_node(&self.nodes[i])
                    && (self.pred[i].is_empty() || self.succ[i].is_empty()))
            })
            .collect()
    }

    fn in_degree(&self, i: usize, alive: &[bool]) -> usize {
        self.pred[i].iter().filter(|&&j| alive[j]).count()
    }

    fn out_degree(&self, i: usize, alive: &[bool]) -> usize {
        self.succ[i].iter().filter(|&&j| alive[j]).count()
    }

    /// Weak components in order of their first node, nodes in insertion order.
    fn weak_components(&self, alive: &[bool]) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();
        for start in 0..self.nodes.len() {
            if !alive[start] || seen[start] {
                continue;
            }
            let mut members = Vec::new();
            let mut queue = VecDeque::from([start]);
            seen[start] = true;
            while let Some(n) = queue.pop_front() {
                members.push(n);
                for &m in self.succ[n].iter().chain(self.pred[n].iter()) {
                    if alive[m] && !seen[m] {
                        seen[m] = true;
                        queue.push_back(m);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Weak connectivity plus the entry and exit species of each part.
    ///
    /// An empty network is reported as disconnected with no subnetworks.
    pub fn check_continuity(&self) -> Continuity {
        let alive = self.alive_mask();
        let components = self.weak_components(&alive);

        if components.len() == 1 {
            info!("network is weakly connected");
            let terminal = self.terminal_nodes_with(&alive);
            return Continuity {
                connected: true,
                subnetworks: vec![Subnetwork {
                    sources: terminal.source,
                    sinks: terminal.sink,
                }],
            };
        }

        let mut subnetworks = Vec::with_capacity(components.len());
        for (i, members) in components.iter().enumerate() {
            let min_in = members
                .iter()
                .map(|&n| self.in_degree(n, &alive))
                .min()
                .unwrap_or(0);
            let min_out = members
                .iter()
                .map(|&n| self.out_degree(n, &alive))
                .min()
                .unwrap_or(0);
            let pick = |deg: &dyn Fn(usize) -> usize, min: usize| -> Vec<String> {
                members
                    .iter()
                    .filter(|&&n| deg(n) == min && !is_dummy_node(&self.nodes[n]))
                    .map(|&n| self.nodes[n].clone())
                    .collect()
            };
            let sources = pick(&|n| self.in_degree(n, &alive), min_in);
            let sinks = pick(&|n| self.out_degree(n, &alive), min_out);
            warn!(
                subnetwork = i + 1,
                ?sources,
                ?sinks,
                "disconnected subnetwork detected"
            );
            subnetworks.push(Subnetwork { sources, sinks });
        }

        Continuity {
            connected: false,
            subnetworks,
        }
    }

    fn terminal_nodes_with(&self, alive: &[bool]) -> TerminalNodes {
        let mut terminal = TerminalNodes::default();
        for (i, name) in self.nodes.iter().enumerate() {
            if !alive[i] || is_dummy_node(name) {
                continue;
            }
            if self.in_degree(i, alive) == 0 {
                terminal.source.push(name.clone());
            }
            if self.out_degree(i, alive) == 0 {
                terminal.sink.push(name.clone());
            }
        }
        debug!(
            sources = terminal.source.len(),
            sinks = terminal.sink.len(),
            "terminal nodes identified"
        );
        terminal
    }

    /// Species without upstream (source) or downstream (sink) reactions.
    pub fn find_terminal_nodes(&self) -> TerminalNodes {
        self.terminal_nodes_with(&self.alive_mask())
    }
}

fn list_literal(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Markdown description of disconnected parts, used in the continuity repair prompt.
pub fn describe_subnetworks(subnetworks: &[Subnetwork]) -> String {
    subnetworks
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "### Subnetwork {}\n- Source nodes: {}\n- Sink nodes: {}",
                i + 1,
                list_literal(&s.sources),
                list_literal(&s.sinks)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
