//! Built-in prompt templates. Placeholders are `{name}` and are filled by
//! `PromptManager::render`.

pub const SYSTEM_PROMPT: &str = r#"
You are an expert in kinetic modeling and biochemical reaction systems. Your task is to infer reactions between biological entities based on given information and express them in a structured format.

Guidelines:
1. Always use the reference table provided below to categorize reactions.
2. Output each reaction as a single line, following the format in the reference table.
3. Maintain clarity and consistency in entity names and reaction expressions.
4. Do not change the format itself (including symbols, arrows, word order, etc.); adhere strictly to the provided example notation.

Reference Table:
| Reaction Type       | Format (Entities are examples)                  |
|---------------------|-----------------------------------------------|
| dimerize            | A dimerizes <--> A-A                           |
| bind                | A binds B <--> A_B                             |
| dissociate          | A_B dissociates to A and B                     |
| phosphorylate       | B phosphorylates A --> A_p                     |
| is phosphorylated   | A is phosphorylated <--> A_p                   |
| dephosphorylate     | B dephosphorylates A_p --> A                   |
| is dephosphorylated | A_p is dephosphorylated --> A                  |
| transcribe          | B transcribes A                                |
| synthesize          | B synthesizes A                                |
| is synthesized      | A is synthesized                               |
| degrade             | B degrades A                                   |
| is degraded         | A is degraded                                  |
| translocate         | A_cytoplasm translocates <--> A_nucleus        |
| activate            | A activates B                                  |
| inhibit             | A inhibits B                                   |
| state transition    | A <--> B                                       |

Key alignment points:
1. Phosphorylation states: `_p` (1x), `_pp` (2x). No `u/ p/ pp` prefixes.
2. Dimers: homodimer `A-A`; hetero-complex `A_B`.
3. Remove non-essential prefixes (e.g., `Sig_`, `Path_`, `Mod_`) so that only the core molecule name remains.

Examples:
EGF binds ErbB1 <--> EGF_ErbB1
EGFR_Shc is phosphorylated <--> EGFR_Shc_p
DUSP_nuc translocates <--> DUSP_cyt
"#;

pub const GENERATION_PROMPT: &str = r#"
Generate kinetic reaction equations that describe the relationships among the following genes based on the given reaction table. There may be multiple valid equations. Extract the necessary information from the table, identify common reaction patterns, and aggregate redundant expressions. Strictly follow the format specified in the system prompt.

### Genes (Reaction Components):
{genes}

### Guidelines:
- For the "Reaction" in the Reaction Table, infer the reaction type from the rate equation and write the reaction equation in the specified format.
- Convert gene names into their corresponding functional protein names where appropriate (e.g., **ERK**, **PI3K**, **Wnt**).
- Ensure that the equations reflect biologically meaningful interactions based on the given reaction table.

### Reaction Table:
{reference_tbl}

### Output:
Provide the equations strictly following the format specified in the system prompt, one per line. Do not include any explanations or additional text.
"#;

pub const REWRITE_PROMPT: &str = r#"
Rewrite the following kinetic reaction equations so that they are biologically meaningful and follow the format specified in the system prompt. Correct any errors, inaccuracies, or inconsistencies in the equations.

### Invalid lines:
{invalid_lines}

### Output:
Provide the equations strictly following the format specified in the system prompt, one per line. Do not include any explanations or additional text.
"#;

pub const INTEGRATE_MODEL_PROMPT: &str = r#"
Create a connected biological reaction network from the provided equations.

**Equations:**
{equations}

**Main Pathways:**
{main_signaling_pathways}

**Expected Readouts:**
{expected_readouts}

**Requirements:**
1. **Connect equations into one continuous network** - add biological reactions to bridge gaps if needed
2. **Focus on main pathways**
   - Keep equations relevant to pathways/readouts, discard irrelevant ones
   - For every keyword in *Main Pathways*, also include any synonymous or paralogous molecules present in *Equations* (e.g., other members of the same receptor or kinase family) and connect them into the same signaling stream.
3. **Unify notation** - treat phosphorylation variants as identical (e.g., ERK1_p -> ERK_p)
4. **Maintain biological accuracy** - only add well-established biological reactions

**Output:** Reaction equations only, one per line, following system format.
"#;

pub const DROP_DUPLICATE_PROMPT: &str = r#"
Standardize and deduplicate these reactions:

**Reactions:**
{raw_reactions}

**Rules:**
- 1x phosphorylated -> add "_p"
- 2x phosphorylated -> add "_pp"
- Activated -> add "_act"
- Remove state prefixes (u/p/pp)
- Dimers -> "A-A" format
- Remove "Sig_" prefix
- Collapse isoforms (AKT1/2/3 -> AKT) only if reactions become identical
- Keep one copy of identical reactions, prefer shorter catalyst names

**Output:** Reaction equations only, one per line.
"#;

pub const REWRITE_CONTINUITY_PROMPT: &str = r#"
The following kinetic reaction equations do not form a connected network.

**Equations:**
{equations}

**Subnetworks:**
{subnetworks}

**Main Pathways:**
{main_signaling_pathways}

**Expected Readouts:**
{expected_readouts}

**Task:**
1. Use Subnetwork 1 as the core. Connect other subnetworks by adding biologically meaningful signaling reactions.
2. **Do NOT add reverse reactions.** Add forward reactions (phosphorylation, binding) that create new pathways.
3. Remove irrelevant equations. Unify notation for same molecules.
4. Ensure expected readouts are reachable through connected pathways.

**Output:** Reaction equations only, one per line, following system format.
"#;

pub const PREVENT_DIVERGENCE_PROMPT: &str = r#"
# Task: Add missing degradation reactions to keep mass balance in the model.

## Background
In an ODE-based biochemical model, any species that is produced but never consumed accumulates without bound, which makes the concentrations diverge and prevents steady-state analysis. A species already has a sink if it is (a) dephosphorylated, (b) dissociates reversibly, or (c) already marked with "is degraded" / "degrades". Every other produced species needs an explicit degradation step.

## Steps
1. **Find all products**: list every species that appears on the right side of an arrow.
2. **Check for sinks**: for each product, look for reactions where it
   - gets dephosphorylated (loses _p)
   - dissociates (A_B -> A + B)
   - has explicit degradation ("is degraded")
3. **Add missing degradations**: for species without a sink, add "<Species> is degraded".

## Reaction list
{reactions}

# Output format
Return the full, updated reactions only, one per line, following system format.
"#;

pub const REWRITE_ACTIVATION_INHIBITION_PROMPT: &str = r#"
You are a biochemical reaction network assistant.
### Task
Transform the reaction list below into a Michaelis-Menten style reaction network that a simulation engine can read.

### Parameter naming conventions
- **Activation**: V_[Activator]_[Target], K_[Activator]_[Target]
- **Inhibition (direct)**: V_[Inhibitor]i[Target], K_[Target]i
- **Inhibition (competitive)**: V_[Target], K_[Target], Ki_[Inhibitor]

### Processing steps
1. **Scan for activation/inhibition**: find all lines with "activates" or "inhibits".
2. **Identify affected species**: extract regulator and target molecules.
3. **Generate @rxn conversions**: apply the templates below.
4. **Update remaining reactions**: change molecule names to _act/_inact forms.
5. **Assemble output**: @rxn lines first, then the updated reactions.

### Detailed rules
1. **Convert every line containing "activates" or "inhibits"**
   - "A activates B" is an enzyme-regulated conversion of B from its inactive to its active form:
     @rxn B_inact --> B_act : p[V_A_B] * u[A] * u[B_inact] / ( p[K_A_B] + u[B_inact] )
   - "A inhibits B" is an enzyme-mediated de-activation; use one of the two standard forms per reaction:
     @rxn B_act --> B_inact : p[V_AiB] * u[A] * u[B_act] / ( p[K_Bi] + u[B_act] )
     or
     @rxn B_inact --> B_act : p[V_B] * u[B_inact] / ( p[K_B]*(1 + u[A]/p[Ki_A]) + u[B_inact] )
2. **Rename biomolecules**: species that switch states end in `_act` (active form) or `_inact` (inactive form).
3. **Remove the original "activates" / "inhibits" lines** once converted.
4. **Keep every other reaction line unchanged**, but update molecule names to the `_act` / `_inact` convention.
5. **Output** one contiguous plain-text block: all `@rxn` lines first, then the remaining reactions. No explanations, headings, or code fences. Preserve the original ordering where possible.

### Reaction list
{reactions}

# Output format
Return the full, updated reactions only, one per line.
"#;

pub const QUERY_WRITER_INSTRUCTIONS: &str = r#"
You are crafting targeted web search queries to analyze biochemical reactions.

<Reaction Equations>
{reactions}
</Reaction Equations>

{experimental_condition_section}

<Section to Research>
{section_title}: {section_description}
</Section to Research>

<Task>
Generate {number_of_queries} web search queries that will help identify:
- For main signaling pathway: the detailed pathway including intermediate steps, regulatory proteins, and downstream effectors
- For expected readouts: what measurable outcomes result from this pathway activation

The queries should:
1. Be specific to biochemical/molecular biology research
2. Target scientific literature and databases
3. Be concise and under 400 characters
{experimental_condition_note}
</Task>

<Format>
Respond with a JSON object only:
{"queries": [{"search_query": "..."}]}
</Format>
"#;

pub const SECTION_WRITER_INSTRUCTIONS: &str = r#"
You are analyzing biochemical reactions based on web search results.

<Reaction Equations>
{reactions}
</Reaction Equations>

{experimental_condition_section}

<Section to Write>
{section_title}: {section_description}
</Section to Write>

<Context from Web Search>
{context}
</Context from Web Search>

<Task>
Based on the search results, write an EXTREMELY CONCISE summary for this section.

Guidelines:
- Be direct and factual; no explanations or reasoning
- For main signaling pathway: write 1-2 sentences describing the core pathway(s)
  - Format: "Pathway-name cascade (ligand -> receptor -> component -> component -> effector)"
  - If there are parallel pathways, list both concisely
- For expected readouts: list 2-3 KEY readouts that directly measure reaction components or immediate downstream targets
  - Format: "- Phospho-protein (site) - brief functional note"
  - Prioritize molecules from the reaction equations
  - Maximum 10-15 words per readout
- NO introductory text, NO categories, NO detailed explanations
{experimental_condition_note}
</Task>

<Format>
Respond with a JSON object only:
{"content": "your concise findings", "sources": ["supporting URL", "..."]}
</Format>
"#;

pub const READOUT_EVALUATION_INSTRUCTIONS: &str = r#"
You are evaluating whether expected readouts should be refined to include more downstream molecules from the reaction equations.

<Reaction Equations>
{reactions}
</Reaction Equations>

<Main Signaling Pathway>
{main_pathway}
</Main Signaling Pathway>

<Current Expected Readouts>
{current_readouts}
</Current Expected Readouts>

<Task>
Evaluate whether the <Current Expected Readouts> are sufficient and optimal for assessing the <Main Signaling Pathway>. Decide whether the readouts should be refined to better reflect key components, activation states, or critical nodes of this pathway.

Consider:
1. How well do the current readouts represent the key signaling molecules and their activation states (e.g., specific phosphorylations, cleavages) of the pathway?
2. Are critical upstream activators, downstream effectors, or feedback components missing from the readouts?
3. Would modifying or adding readouts give a more precise view of the pathway's activity, branches, or points of regulation?
4. Are the current readouts too generic, or do they miss markers that are highly indicative of the pathway's engagement?
5. Readouts must stay focused on the <Main Signaling Pathway>.
</Task>

<Format>
Respond with a JSON object only:
{"should_refine": true or false, "reasoning": "max 2 sentences", "suggested_improvements": "molecules from the reactions to add, empty when should_refine is false"}
</Format>
"#;

pub const READOUT_REFINEMENT_INSTRUCTIONS: &str = r#"
You are refining expected readouts based on feedback.

<Reaction Equations>
{reactions}
</Reaction Equations>

<Main Signaling Pathway>
{main_pathway}
</Main Signaling Pathway>

<Current Expected Readouts>
{current_readouts}
</Current Expected Readouts>

<Suggested Improvements>
{suggested_improvements}
</Suggested Improvements>

<Task>
Refine the <Current Expected Readouts> by integrating the <Suggested Improvements>. The result is a concise list of 2-3 key indicators that best represent the activation state, critical components, or measurable outputs of the <Main Signaling Pathway>.

Guidelines:
- Stay focused on the <Main Signaling Pathway>
- Keep the format: "- Phospho-protein (site) - brief functional note"
- Include 2-3 KEY readouts total
- Prioritize downstream molecules from the reactions
- Maximum 10-15 words per readout
- NO introductory text or explanations

Return only the refined bullet points.
</Task>
"#;

pub const FEEDBACK_CROSSTALK_QUERY_WRITER: &str = r#"
You are generating web search queries to identify feedback loops and pathway crosstalk in biochemical networks.

<Current Network>
{reactions}
</Current Network>

<Source Nodes (Pathway Inputs)>
{source_nodes}
</Source Nodes>

<Sink Nodes (Pathway Outputs - HIGH PRIORITY)>
{sink_nodes}
</Sink Nodes>

<Main Signaling Pathway>
{main_signaling_pathways}
</Main Signaling Pathway>

<Expected Readouts>
{expected_readouts}
</Expected Readouts>

<Task>
Generate {number_of_queries} specific web search queries to identify:

**Feedback loops (prioritize sink nodes):**
- How do the sink nodes (pathway outputs) regulate the source nodes (pathway inputs)?
- Negative feedback: sink nodes inhibiting upstream components
- Positive feedback: sink nodes enhancing upstream pathway components
- Direct regulatory connections from sink nodes back to the network

**Pathway crosstalk:**
- Which other pathways regulate the sink nodes?
- How do sink nodes influence other signaling pathways?
- Shared regulatory mechanisms involving sink node proteins
</Task>

<Query Requirements>
- At least half of the queries include sink node proteins: {sink_nodes}
- Target scientific literature and pathway databases
- Under 400 characters each
- Use varied search terms (feedback, regulation, inhibition, crosstalk, etc.)
</Query Requirements>

<Format>
Respond with a JSON object only:
{"queries": [{"search_query": "..."}]}
</Format>
"#;

pub const REACTION_ENHANCEMENT_PROMPT: &str = r#"
You are an expert in kinetic modeling and biochemical reaction systems. Identify additional feedback loops and crosstalk reactions based on web search results and add them to the existing reaction network.

<Current Network>
{reactions}
</Current Network>

<Source Nodes>
{source_nodes}
</Source Nodes>

<Sink Nodes (HIGH PRIORITY)>
{sink_nodes}
</Sink Nodes>

<Main Signaling Pathway>
{main_signaling_pathways}
</Main Signaling Pathway>

<Expected Readouts>
{expected_readouts}
</Expected Readouts>

<Web Search Context>
{context}
</Web Search Context>

<Task>
Add reactions involving the sink nodes ({sink_nodes}).

**Focus:** prioritize well-established, major signaling pathways and their canonical interactions.

**Expected reaction types:**
- Feedback loops, only when documented as major regulatory mechanisms:
  - sink nodes inhibiting upstream components (negative feedback)
  - sink nodes activating upstream components (positive feedback)
  - sink node transcriptional regulation of pathway components
- Pathway crosstalk, only well-characterized cross-pathway interactions:
  - other pathways regulating sink nodes
  - sink nodes influencing other signaling pathways

**Addition criteria:** add only reactions needed to complete the main pathway.

**Naming:** molecules already in the Current Network keep their EXACT names (e.g., if the network uses "ERK_p", use "ERK_p"). New molecules use standard biochemical notation (e.g., "mTOR").
</Task>

<Guidelines>
1. Use ONLY the formats of the reference table below
2. Add biologically meaningful reactions supported by the search context
3. NO duplicate reactions
</Guidelines>

<Reference Table>
| Reaction Type       | Format (Entities are examples)          |
|---------------------|-----------------------------------------|
| dimerize            | A dimerizes <--> A-A                    |
| bind                | A binds B <--> A_B                      |
| dissociate          | A_B dissociates to A and B              |
| phosphorylate       | B phosphorylates A --> A_p              |
| is phosphorylated   | A is phosphorylated <--> A_p            |
| dephosphorylate     | B dephosphorylates A_p --> A            |
| is dephosphorylated | A_p is dephosphorylated --> A           |
| transcribe          | B transcribes A                         |
| synthesize          | B synthesizes A                         |
| is synthesized      | A is synthesized                        |
| degrade             | B degrades A                            |
| is degraded         | A is degraded                           |
| translocate         | A_cytoplasm translocates <--> A_nucleus |
| activate            | A activates B                           |
| inhibit             | A inhibits B                            |
| state transition    | A <--> B                                |
</Reference Table>

<Format>
Respond with a JSON object only:
{"added_reactions": ["one reaction per string"], "rationale": "brief explanation", "sources": ["supporting URL from the search context"]}
</Format>
"#;
