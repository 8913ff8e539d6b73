use std::mem;

use crate::chart::{ChartSeries, build_series};
use crate::classifier::is_plottable;
use crate::event::{ChatEvent, EventKind};

/// Renderable unit bundling one turn and its supporting evidence.
///
/// Holds at most one human and one assistant turn. A group with neither
/// exists only to carry orphaned tool results (tool output with no
/// preceding assistant turn in its scope). `charts` receives one entry per
/// tool result whose payload builds a series, in tool-result order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayGroup {
    pub human: Option<ChatEvent>,
    pub assistant: Option<ChatEvent>,
    pub tool_results: Vec<ChatEvent>,
    pub charts: Vec<ChartSeries>,
}

impl DisplayGroup {
    /// Creates a group opened by a human turn.
    pub fn with_human(event: ChatEvent) -> Self {
        Self {
            human: Some(event),
            ..Self::default()
        }
    }

    /// Creates a group carrying only an assistant turn.
    pub fn with_assistant(event: ChatEvent) -> Self {
        Self {
            assistant: Some(event),
            ..Self::default()
        }
    }

    /// Creates a standalone group for a tool result with no assistant in scope.
    pub fn orphan_tool_result(event: ChatEvent) -> Self {
        let mut group = Self::default();
        group.push_tool_result(event);
        group
    }

    /// Returns true when the group holds a human or assistant turn.
    pub fn has_turn(&self) -> bool {
        self.human.is_some() || self.assistant.is_some()
    }

    /// Appends a tool result and its derived chart series when one builds.
    pub fn push_tool_result(&mut self, event: ChatEvent) {
        debug_assert!(event.kind.is_tool(), "only tool events carry chart payloads");
        if let Some(series) = build_series(&event.content) {
            self.charts.push(series);
        }
        self.tool_results.push(event);
    }
}

/// Pre-filter applied before reordering and on every live event.
///
/// Human turns always survive; assistant turns must carry content; tool
/// events survive only when their payload is chart-plottable.
fn keep_event(event: &ChatEvent) -> bool {
    match event.kind {
        EventKind::Human => true,
        EventKind::Assistant => !event.content.is_empty(),
        EventKind::ToolInvocation | EventKind::ToolResult => is_plottable(&event.content),
    }
}

/// Mutable snapshot of one human turn while scanning for its reply.
#[derive(Debug, Clone, PartialEq)]
struct TurnAccumulator {
    human: ChatEvent,
    assistant: Option<ChatEvent>,
    pending_tool_results: Vec<ChatEvent>,
}

impl TurnAccumulator {
    fn begin(human: ChatEvent) -> Self {
        Self {
            human,
            assistant: None,
            pending_tool_results: Vec::new(),
        }
    }

    /// Emits the canonical turn order: human, reply (if found), then the
    /// buffered tool results in their original relative order.
    fn close(self) -> Vec<ChatEvent> {
        let mut emitted = Vec::with_capacity(2 + self.pending_tool_results.len());
        emitted.push(self.human);
        if let Some(assistant) = self.assistant {
            emitted.push(assistant);
        }
        emitted.extend(self.pending_tool_results);
        emitted
    }
}

/// Scanning state for the reordering pass.
///
/// The backend emits `Human -> {ToolResult}* -> Assistant` per turn, possibly
/// interleaved or with the reply missing entirely. Each step consumes one
/// event and returns the next state plus the events emitted so far, so every
/// transition is testable in isolation.
#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    AwaitingTurn,
    CollectingTurn(TurnAccumulator),
}

impl ScanState {
    fn step(self, event: ChatEvent) -> (Self, Vec<ChatEvent>) {
        match self {
            Self::AwaitingTurn => match event.kind {
                EventKind::Human => (
                    Self::CollectingTurn(TurnAccumulator::begin(event)),
                    Vec::new(),
                ),
                // Leading assistant greetings and orphan runs pass through
                // unchanged, preserving their original relative order.
                EventKind::Assistant | EventKind::ToolInvocation | EventKind::ToolResult => {
                    (Self::AwaitingTurn, vec![event])
                }
            },
            Self::CollectingTurn(mut accumulator) => match event.kind {
                EventKind::Human => {
                    let emitted = accumulator.close();
                    (Self::CollectingTurn(TurnAccumulator::begin(event)), emitted)
                }
                EventKind::Assistant => {
                    // The first reply closes the turn: the answer surfaces
                    // before the tool evidence that produced it. Anything
                    // after the reply is an orphan for the next scan.
                    accumulator.assistant = Some(event);
                    (Self::AwaitingTurn, accumulator.close())
                }
                EventKind::ToolInvocation | EventKind::ToolResult => {
                    accumulator.pending_tool_results.push(event);
                    (Self::CollectingTurn(accumulator), Vec::new())
                }
            },
        }
    }

    fn finish(self) -> Vec<ChatEvent> {
        match self {
            Self::AwaitingTurn => Vec::new(),
            Self::CollectingTurn(accumulator) => accumulator.close(),
        }
    }
}

/// Reorders a pre-filtered event sequence into canonical turn order.
pub fn reorder_events(events: Vec<ChatEvent>) -> Vec<ChatEvent> {
    let mut reordered = Vec::with_capacity(events.len());
    let mut state = ScanState::AwaitingTurn;

    for event in events {
        let (next_state, emitted) = state.step(event);
        state = next_state;
        reordered.extend(emitted);
    }

    reordered.extend(state.finish());
    reordered
}

/// Folds a reordered sequence into display groups.
fn group_events(events: Vec<ChatEvent>) -> Vec<DisplayGroup> {
    let mut groups = Vec::new();
    let mut current = DisplayGroup::default();

    for event in events {
        match event.kind {
            EventKind::Human => {
                if current.has_turn() {
                    groups.push(mem::take(&mut current));
                }
                current.human = Some(event);
            }
            EventKind::Assistant => {
                if current.assistant.is_some() {
                    groups.push(mem::take(&mut current));
                }
                current.assistant = Some(event);
            }
            EventKind::ToolInvocation | EventKind::ToolResult => {
                if current.assistant.is_some() {
                    current.push_tool_result(event);
                } else {
                    // No assistant in scope: emit immediately instead of
                    // buffering, so no group is silently dropped at the end.
                    groups.push(DisplayGroup::orphan_tool_result(event));
                }
            }
        }
    }

    if current.has_turn() {
        groups.push(current);
    }

    groups
}

/// Full batch reconstruction: filter, reorder, then group.
pub fn reconstruct(events: &[ChatEvent]) -> Vec<DisplayGroup> {
    let filtered = events
        .iter()
        .filter(|event| keep_event(event))
        .cloned()
        .collect();
    group_events(reorder_events(filtered))
}

/// Ordered display groups for one chat.
///
/// Rebuilt from scratch on every chat load and appended to incrementally
/// while streaming; live application mirrors the batch grouping rules one
/// event at a time without rescanning history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    groups: Vec<DisplayGroup>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch-reconstructs a transcript from a stored event sequence.
    pub fn from_events(events: &[ChatEvent]) -> Self {
        Self {
            groups: reconstruct(events),
        }
    }

    pub fn groups(&self) -> &[DisplayGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Applies one live event.
    ///
    /// Returns false when the pre-filter drops the event. A human turn opens
    /// a new trailing group; an assistant turn attaches to a trailing group
    /// that still lacks a reply, otherwise opens a fresh assistant-only
    /// group; a plottable tool result appends to the trailing group when it
    /// already carries a reply, otherwise becomes a standalone orphan group.
    pub fn apply_live(&mut self, event: ChatEvent) -> bool {
        if !keep_event(&event) {
            return false;
        }

        match event.kind {
            EventKind::Human => self.groups.push(DisplayGroup::with_human(event)),
            EventKind::Assistant => match self.groups.last_mut() {
                Some(trailing) if trailing.assistant.is_none() => {
                    trailing.assistant = Some(event);
                }
                _ => self.groups.push(DisplayGroup::with_assistant(event)),
            },
            EventKind::ToolInvocation | EventKind::ToolResult => match self.groups.last_mut() {
                Some(trailing) if trailing.assistant.is_some() => {
                    trailing.push_tool_result(event);
                }
                _ => self.groups.push(DisplayGroup::orphan_tool_result(event)),
            },
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLOTTABLE: &str = "{\"graph_data\": {\"05-03-2024\": 100, \"01-03-2024\": 90}}";
    const PLOTTABLE_SECOND: &str = "{\"graph_data\": {\"10-03-2024\": 110}}";

    fn kinds(events: &[ChatEvent]) -> Vec<EventKind> {
        events.iter().map(|event| event.kind).collect()
    }

    #[test]
    fn leading_assistant_greeting_stays_first_and_unmoved() {
        let greeting = ChatEvent::assistant("welcome");
        let events = vec![
            greeting.clone(),
            ChatEvent::human("hi"),
            ChatEvent::assistant("hello"),
        ];

        let reordered = reorder_events(events);
        assert_eq!(reordered[0], greeting);
        assert_eq!(
            kinds(&reordered),
            vec![EventKind::Assistant, EventKind::Human, EventKind::Assistant]
        );
    }

    #[test]
    fn answer_surfaces_before_tool_evidence() {
        let events = vec![
            ChatEvent::human("price?"),
            ChatEvent::tool_result(PLOTTABLE),
            ChatEvent::tool_result(PLOTTABLE_SECOND),
            ChatEvent::assistant("here you go"),
        ];

        let reordered = reorder_events(events);
        assert_eq!(
            kinds(&reordered),
            vec![
                EventKind::Human,
                EventKind::Assistant,
                EventKind::ToolResult,
                EventKind::ToolResult,
            ]
        );
        // Tool results keep their original relative order.
        assert_eq!(reordered[2].content, PLOTTABLE);
        assert_eq!(reordered[3].content, PLOTTABLE_SECOND);
    }

    #[test]
    fn truncated_turn_without_reply_emits_human_then_tools() {
        let events = vec![
            ChatEvent::human("price?"),
            ChatEvent::tool_result(PLOTTABLE),
        ];

        let reordered = reorder_events(events);
        assert_eq!(kinds(&reordered), vec![EventKind::Human, EventKind::ToolResult]);
    }

    #[test]
    fn events_after_the_reply_pass_through_as_orphans() {
        let events = vec![
            ChatEvent::human("price?"),
            ChatEvent::tool_result(PLOTTABLE),
            ChatEvent::assistant("answer"),
            ChatEvent::tool_result(PLOTTABLE_SECOND),
        ];

        let reordered = reorder_events(events);
        assert_eq!(
            kinds(&reordered),
            vec![
                EventKind::Human,
                EventKind::Assistant,
                EventKind::ToolResult,
                EventKind::ToolResult,
            ]
        );
        // The post-reply orphan stays last.
        assert_eq!(reordered[3].content, PLOTTABLE_SECOND);
    }

    #[test]
    fn reordering_is_idempotent_on_canonical_input() {
        let canonical = vec![
            ChatEvent::human("price?"),
            ChatEvent::assistant("answer"),
            ChatEvent::tool_result(PLOTTABLE),
        ];

        assert_eq!(reorder_events(canonical.clone()), canonical);
    }

    #[test]
    fn filter_drops_empty_assistant_and_unplottable_tools() {
        let events = vec![
            ChatEvent::human("hi"),
            ChatEvent::assistant(""),
            ChatEvent::tool_result("not json"),
            ChatEvent::assistant("hello"),
        ];

        let groups = reconstruct(&events);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].human.as_ref().map(|e| e.content.as_str()), Some("hi"));
        assert_eq!(
            groups[0].assistant.as_ref().map(|e| e.content.as_str()),
            Some("hello")
        );
        assert!(groups[0].tool_results.is_empty());
    }

    #[test]
    fn lone_human_turn_yields_a_standalone_group() {
        let groups = reconstruct(&[ChatEvent::human("anyone there?")]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].human.is_some());
        assert!(groups[0].assistant.is_none());
        assert!(groups[0].tool_results.is_empty());
    }

    #[test]
    fn consecutive_humans_each_close_the_previous_group() {
        let groups = reconstruct(&[ChatEvent::human("h1"), ChatEvent::human("h2")]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].human.as_ref().map(|e| e.content.as_str()), Some("h1"));
        assert_eq!(groups[1].human.as_ref().map(|e| e.content.as_str()), Some("h2"));
        assert!(groups.iter().all(|group| group.assistant.is_none()));
    }

    #[test]
    fn full_turn_groups_answer_with_its_evidence() {
        let events = vec![
            ChatEvent::human("price?"),
            ChatEvent::tool_result(PLOTTABLE),
            ChatEvent::tool_result(PLOTTABLE_SECOND),
            ChatEvent::assistant("answer"),
        ];

        let groups = reconstruct(&events);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert!(group.human.is_some());
        assert!(group.assistant.is_some());
        assert_eq!(group.tool_results.len(), 2);
        assert_eq!(group.charts.len(), 2);
        assert_eq!(group.charts[0].labels, vec!["01/03/24", "05/03/24"]);
    }

    #[test]
    fn orphan_tool_result_becomes_its_own_group() {
        let groups = reconstruct(&[ChatEvent::tool_result(PLOTTABLE)]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert!(group.human.is_none());
        assert!(group.assistant.is_none());
        assert_eq!(group.tool_results.len(), 1);
        assert_eq!(group.charts.len(), 1);
    }

    #[test]
    fn leading_greeting_and_real_turn_yield_separate_groups() {
        let events = vec![
            ChatEvent::assistant("greeting"),
            ChatEvent::human("hi"),
            ChatEvent::assistant("hello"),
        ];

        let groups = reconstruct(&events);
        assert_eq!(groups.len(), 2);
        // The greeting fills the first group's assistant slot; the human turn
        // then closes it and pairs with the real reply.
        assert!(groups[0].human.is_none());
        assert_eq!(
            groups[0].assistant.as_ref().map(|e| e.content.as_str()),
            Some("greeting")
        );
        assert!(groups[1].human.is_some());
        assert_eq!(
            groups[1].assistant.as_ref().map(|e| e.content.as_str()),
            Some("hello")
        );
    }

    #[test]
    fn batch_matches_naive_grouping_on_canonical_sequences() {
        let canonical = vec![
            ChatEvent::human("q1"),
            ChatEvent::assistant("a1"),
            ChatEvent::tool_result(PLOTTABLE),
            ChatEvent::human("q2"),
            ChatEvent::assistant("a2"),
        ];

        let via_pipeline = reconstruct(&canonical);
        let via_grouping_alone = group_events(canonical);
        assert_eq!(via_pipeline, via_grouping_alone);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(reconstruct(&[]).is_empty());
    }

    #[test]
    fn live_human_opens_a_trailing_group() {
        let mut transcript = Transcript::new();
        assert!(transcript.apply_live(ChatEvent::human("hi")));

        assert_eq!(transcript.len(), 1);
        assert!(transcript.groups()[0].human.is_some());
    }

    #[test]
    fn live_assistant_attaches_to_trailing_group_without_reply() {
        let mut transcript = Transcript::new();
        transcript.apply_live(ChatEvent::human("hi"));
        transcript.apply_live(ChatEvent::assistant("hello"));

        assert_eq!(transcript.len(), 1);
        assert!(transcript.groups()[0].assistant.is_some());
    }

    #[test]
    fn live_assistant_after_complete_group_opens_a_new_one() {
        let mut transcript = Transcript::new();
        transcript.apply_live(ChatEvent::human("hi"));
        transcript.apply_live(ChatEvent::assistant("hello"));
        transcript.apply_live(ChatEvent::assistant("afterthought"));

        assert_eq!(transcript.len(), 2);
        assert!(transcript.groups()[1].human.is_none());
        assert_eq!(
            transcript.groups()[1]
                .assistant
                .as_ref()
                .map(|e| e.content.as_str()),
            Some("afterthought")
        );
    }

    #[test]
    fn live_tool_result_appends_to_trailing_group_with_reply() {
        let mut transcript = Transcript::new();
        transcript.apply_live(ChatEvent::human("price?"));
        transcript.apply_live(ChatEvent::assistant("answer"));
        transcript.apply_live(ChatEvent::tool_result(PLOTTABLE));

        assert_eq!(transcript.len(), 1);
        let group = &transcript.groups()[0];
        assert_eq!(group.tool_results.len(), 1);
        assert_eq!(group.charts.len(), 1);
    }

    #[test]
    fn live_tool_result_without_reply_becomes_an_orphan_group() {
        let mut transcript = Transcript::new();
        transcript.apply_live(ChatEvent::human("price?"));
        transcript.apply_live(ChatEvent::tool_result(PLOTTABLE));

        assert_eq!(transcript.len(), 2);
        let orphan = &transcript.groups()[1];
        assert!(orphan.human.is_none());
        assert!(orphan.assistant.is_none());
        assert_eq!(orphan.tool_results.len(), 1);
    }

    #[test]
    fn live_filter_drops_unplottable_and_empty_events() {
        let mut transcript = Transcript::new();
        assert!(!transcript.apply_live(ChatEvent::assistant("")));
        assert!(!transcript.apply_live(ChatEvent::tool_result("not json")));
        assert!(transcript.is_empty());
    }
}
