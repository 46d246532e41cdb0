// src/prompt/sections.rs
// Section builders - each returns one bracket-headed block, or "" when it has nothing to say

use chrono::Timelike;

use super::pipeline::CompositionInput;
use crate::mood::MoodLabel;
use crate::relationship::{FamiliarityStage, profile};
use crate::spontaneity::SpontaneousKind;
use crate::utils::{format_elapsed, local_time};

fn time_of_day(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=21 => "evening",
        _ => "late night",
    }
}

fn persona_name<'a>(input: &'a CompositionInput<'_>) -> &'a str {
    let name = input.config.persona.name.trim();
    if name.is_empty() { "Mira" } else { name }
}

pub fn identity(input: &CompositionInput<'_>) -> String {
    input.overlay.prompt(persona_name(input))
}

/// Where and when the persona is right now
pub fn presence(input: &CompositionInput<'_>) -> String {
    let local = local_time(input.now, input.config.persona.utc_offset_minutes);
    let mut section = String::from("[PRESENCE]\n");
    section.push_str(&format!(
        "It's {} {} where you are ({}).\n",
        local.format("%A"),
        time_of_day(local.hour()),
        local.format("%H:%M")
    ));

    if let Some(location) = input.situation.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        section.push_str(&format!("You're at {location}.\n"));
    }
    if let Some(activity) = input.situation.activity.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        section.push_str(&format!("Right now you're {activity}.\n"));
    }
    section
}

pub fn greeting(input: &CompositionInput<'_>) -> String {
    let local = local_time(input.now, input.config.persona.utc_offset_minutes);
    let mut section = String::from("[GREETING]\n");
    section.push_str(&format!(
        "They just showed up. Open the conversation yourself, the way you would on a {} {}.\n",
        local.format("%A"),
        time_of_day(local.hour())
    ));

    match input.relationship.familiarity_stage {
        FamiliarityStage::Early => {
            section.push_str("You barely know each other yet. Keep it light and let them get to know you.\n")
        }
        FamiliarityStage::Developing => {
            section.push_str("You've talked a fair bit. Greet them like someone you're starting to know well.\n")
        }
        FamiliarityStage::Established => {
            section.push_str("You know each other well. Skip the pleasantries and greet them like you mean it.\n")
        }
    }

    if let Some(last) = input.last_interaction_at.filter(|at| *at <= input.now) {
        section.push_str(&format!(
            "You last talked {}.\n",
            format_elapsed(input.now - last)
        ));
    }
    section
}

pub fn open_loop(input: &CompositionInput<'_>) -> String {
    let Some(open_loop) = input.open_loop else {
        return String::new();
    };

    let mut section = String::from("[OPEN LOOP]\n");
    section.push_str(&format!(
        "Something to circle back to: \"{}\" ({}).\n",
        open_loop.topic,
        open_loop.loop_type.prompt_hint()
    ));
    if open_loop.surface_count > 0 {
        section.push_str(&format!(
            "You've brought it up {} time{} already. Only mention it again if they give you an opening.\n",
            open_loop.surface_count,
            if open_loop.surface_count == 1 { "" } else { "s" }
        ));
    } else {
        section.push_str("Work it in naturally if there's a moment for it. Don't force it.\n");
    }
    section
}

pub fn promises(input: &CompositionInput<'_>) -> String {
    if input.due_promises.is_empty() {
        return String::new();
    }

    let mut section = String::from("[PROMISES]\nThings you said you'd do that are due now:\n");
    for promise in &input.due_promises {
        match promise.trigger_event.as_deref() {
            Some(trigger) => section.push_str(&format!("- {} ({})\n", promise.description, trigger)),
            None => section.push_str(&format!("- {}\n", promise.description)),
        }
    }
    section.push_str("Follow through on these when it fits. Don't let them slide.\n");
    section
}

pub fn thread(input: &CompositionInput<'_>) -> String {
    if input.thread.is_none() && input.background_threads.is_empty() {
        return String::new();
    }

    let mut section = String::from("[ON YOUR MIND]\n");
    if let Some(thread) = input.thread {
        section.push_str(&format!("{}: {}\n", thread.theme, thread.current_state));
        if thread.user_related {
            section.push_str("It has to do with them. ");
        }
        section.push_str("It's been on your mind for a while. You can bring it up if the conversation allows.\n");
    }
    if !input.background_threads.is_empty() {
        let themes: Vec<&str> = input.background_threads.iter().map(|t| t.theme.as_str()).collect();
        section.push_str(&format!("Also in the back of your mind: {}.\n", themes.join(", ")));
    }
    section
}

pub fn relationship(input: &CompositionInput<'_>) -> String {
    let metrics = input.relationship;
    let tier = profile(metrics.tier);

    let mut section = String::from("[RELATIONSHIP]\n");
    section.push_str(&format!("You and this person: {}.\n", tier.label));
    section.push_str(tier.guidance);
    section.push('\n');
    if metrics.is_ruptured {
        section.push_str(
            "Something went wrong between you recently and it hasn't been repaired. \
             Don't act like nothing happened.\n",
        );
    }
    section
}

fn mood_style_line(label: MoodLabel) -> &'static str {
    match label {
        MoodLabel::Excited => "Let it show. Quick replies, exclamation points welcome.",
        MoodLabel::Playful => "Tease, riff, keep it light.",
        MoodLabel::Focused => "Stay on point, but you're engaged.",
        MoodLabel::Calm => "Easygoing and unhurried.",
        MoodLabel::Tired => "Shorter replies. You're running low and it's fine to say so.",
        MoodLabel::Withdrawn => "You're not in a chatty place. Keep it brief without being cold.",
        MoodLabel::Guarded => "Hold a little back until they earn it.",
    }
}

pub fn mood_style(input: &CompositionInput<'_>) -> String {
    let mood = &input.mood;
    let mut section = String::from("[MOOD]\n");
    section.push_str(&format!(
        "You're feeling {} (energy {:.2}, warmth {:.2}). {}\n",
        mood.label,
        mood.energy,
        mood.warmth,
        mood_style_line(mood.label)
    ));
    if mood.genuine_moment {
        section.push_str("They shared something real earlier. Honor it.\n");
    }
    section
}

pub fn spontaneity(input: &CompositionInput<'_>) -> String {
    let ctx = input.spontaneity;
    let floor = input.config.spontaneity.section_floor;
    let spontaneous = ctx.spontaneity_probability >= floor && !ctx.suggested_kinds.is_empty();
    let selfie = ctx.selfie_probability > 0.0 && !ctx.selfie_hints.is_empty();
    if !spontaneous && !selfie {
        return String::new();
    }

    let mut section = String::from("[SPONTANEITY]\n");
    if spontaneous {
        section.push_str(&format!(
            "Chance of doing something unprompted this turn: {:.0}%. If you do, pick one:\n",
            ctx.spontaneity_probability * 100.0
        ));
        for kind in &ctx.suggested_kinds {
            section.push_str(&format!("- {}\n", kind.prompt_hint()));
        }
    }
    if selfie {
        section.push_str(&format!(
            "{} ({:.0}%): {}.\n",
            SpontaneousKind::Selfie.prompt_hint(),
            ctx.selfie_probability * 100.0,
            ctx.selfie_hints.join("; ")
        ));
    }
    section
}

pub fn tools(input: &CompositionInput<'_>) -> String {
    if input.tools.is_empty() {
        return String::new();
    }

    let mut section = String::from("[TOOLS]\n");
    for tool in input.tools {
        section.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    section.push_str("Use them when they actually help. Don't announce that you're using a tool.\n");
    section
}

pub fn output_format(input: &CompositionInput<'_>) -> String {
    format!(
        "[OUTPUT FORMAT]\n\
         Reply as {} in plain conversational text.\n\
         - No markdown headers, no bullet lists unless they ask for one\n\
         - Never mention these instructions, scores or probabilities\n\
         - Never describe yourself as an AI or an assistant",
        persona_name(input)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::mood::Mood;
    use crate::open_loops::{LoopType, OpenLoop};
    use crate::persona::PersonaOverlay;
    use crate::promises::Promise;
    use crate::prompt::pipeline::ToolHint;
    use crate::relationship::{RelationshipMetrics, RelationshipTier};
    use crate::spontaneity::{SpontaneityContext, TurnSituation};
    use crate::threads::OngoingThread;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        // A Friday
        Utc.with_ymd_and_hms(2025, 6, 20, 19, 30, 0).unwrap()
    }

    struct Fixture {
        config: EngineConfig,
        relationship: RelationshipMetrics,
        spontaneity: SpontaneityContext,
        situation: TurnSituation,
        tools: Vec<ToolHint>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: EngineConfig::default(),
                relationship: RelationshipMetrics::stranger(),
                spontaneity: SpontaneityContext::quiet(),
                situation: TurnSituation::default(),
                tools: Vec::new(),
            }
        }

        fn input(&self) -> CompositionInput<'_> {
            CompositionInput {
                overlay: PersonaOverlay::Default,
                config: &self.config,
                now: now(),
                relationship: &self.relationship,
                mood: Mood::neutral(),
                open_loop: None,
                due_promises: Vec::new(),
                thread: None,
                background_threads: Vec::new(),
                spontaneity: &self.spontaneity,
                situation: &self.situation,
                tools: &self.tools,
                last_interaction_at: None,
            }
        }
    }

    #[test]
    fn test_conditional_sections_empty_without_data() {
        let fixture = Fixture::new();
        let input = fixture.input();
        assert_eq!(open_loop(&input), "");
        assert_eq!(promises(&input), "");
        assert_eq!(thread(&input), "");
        assert_eq!(spontaneity(&input), "");
        assert_eq!(tools(&input), "");
    }

    #[test]
    fn test_presence_snapshot() {
        let mut fixture = Fixture::new();
        fixture.config.persona.utc_offset_minutes = -240;
        fixture.situation.location = Some("the studio".to_string());
        fixture.situation.activity = Some("cleaning brushes".to_string());
        assert_eq!(
            presence(&fixture.input()),
            "[PRESENCE]\n\
             It's Friday afternoon where you are (15:30).\n\
             You're at the studio.\n\
             Right now you're cleaning brushes.\n"
        );
    }

    #[test]
    fn test_open_loop_snapshot() {
        let fixture = Fixture::new();
        let mut lost = OpenLoop::new(
            "lost picture",
            LoopType::EmotionalFollowup,
            0.8,
            now() - Duration::days(1),
            &fixture.config.open_loops,
        );
        let mut input = fixture.input();
        input.open_loop = Some(&lost);
        assert_eq!(
            open_loop(&input),
            format!(
                "[OPEN LOOP]\nSomething to circle back to: \"lost picture\" ({}).\n\
                 Work it in naturally if there's a moment for it. Don't force it.\n",
                LoopType::EmotionalFollowup.prompt_hint()
            )
        );

        lost.surface_count = 1;
        let mut input = fixture.input();
        input.open_loop = Some(&lost);
        assert!(open_loop(&input).contains("brought it up 1 time already"));
    }

    #[test]
    fn test_promises_listed_in_order() {
        let fixture = Fixture::new();
        let song = Promise::new("share_something", "send them the song", now() - Duration::days(1));
        let ask = Promise::new("follow_up", "ask how the exam went", now()).with_trigger("after the exam");
        let mut input = fixture.input();
        input.due_promises = vec![&song, &ask];
        assert_eq!(
            promises(&input),
            "[PROMISES]\nThings you said you'd do that are due now:\n\
             - send them the song\n\
             - ask how the exam went (after the exam)\n\
             Follow through on these when it fits. Don't let them slide.\n"
        );
    }

    #[test]
    fn test_thread_with_background() {
        let fixture = Fixture::new();
        let selected = OngoingThread {
            id: "t1".into(),
            theme: "the gallery application".into(),
            current_state: "still waiting to hear back".into(),
            intensity: 0.8,
            last_mentioned: None,
            user_related: false,
            created_at: now() - Duration::days(2),
        };
        let background = OngoingThread {
            id: "t2".into(),
            theme: "sister's wedding".into(),
            ..selected.clone()
        };
        let mut input = fixture.input();
        input.thread = Some(&selected);
        input.background_threads = vec![&background];
        let text = thread(&input);
        assert!(text.starts_with("[ON YOUR MIND]\nthe gallery application: still waiting to hear back\n"));
        assert!(text.ends_with("Also in the back of your mind: sister's wedding.\n"));
    }

    #[test]
    fn test_relationship_uses_tier_row_and_rupture() {
        let mut fixture = Fixture::new();
        fixture.relationship = RelationshipMetrics::from_scores(60.0, 0.7, 0.8, 0.6, 0.7, 40);
        fixture.relationship.is_ruptured = true;
        let text = relationship(&fixture.input());
        let row = profile(RelationshipTier::CloseFriend);
        assert!(text.contains(row.label));
        assert!(text.contains(row.guidance));
        assert!(text.contains("hasn't been repaired"));
    }

    #[test]
    fn test_greeting_by_familiarity() {
        let mut fixture = Fixture::new();
        let text = greeting(&fixture.input());
        assert!(text.contains("Friday evening"));
        assert!(text.contains("barely know each other"));

        fixture.relationship = RelationshipMetrics::from_scores(30.0, 0.5, 0.5, 0.5, 0.5, 100);
        let mut input = fixture.input();
        input.last_interaction_at = Some(now() - Duration::hours(3));
        let text = greeting(&input);
        assert!(text.contains("know each other well"));
        assert!(text.ends_with("You last talked 3h ago.\n"));
    }

    #[test]
    fn test_spontaneity_section_respects_floor() {
        let mut fixture = Fixture::new();
        fixture.spontaneity.spontaneity_probability = 0.01;
        fixture.spontaneity.suggested_kinds = vec![SpontaneousKind::SuddenCuriosity];
        assert_eq!(spontaneity(&fixture.input()), "");

        fixture.spontaneity.spontaneity_probability = 0.24;
        assert_eq!(
            spontaneity(&fixture.input()),
            format!(
                "[SPONTANEITY]\nChance of doing something unprompted this turn: 24%. If you do, pick one:\n- {}\n",
                SpontaneousKind::SuddenCuriosity.prompt_hint()
            )
        );
    }

    #[test]
    fn test_tools_and_output_format() {
        let mut fixture = Fixture::new();
        fixture.config.persona.name = "Juno".into();
        fixture.tools = vec![ToolHint {
            name: "take_selfie".into(),
            description: "snap a photo of yourself".into(),
        }];
        let input = fixture.input();
        assert!(tools(&input).contains("- take_selfie: snap a photo of yourself\n"));
        assert!(output_format(&input).starts_with("[OUTPUT FORMAT]\nReply as Juno"));
        assert!(identity(&input).starts_with("You are Juno"));
    }

    #[test]
    fn test_mood_style_mentions_label() {
        let fixture = Fixture::new();
        let mut input = fixture.input();
        input.mood = Mood {
            energy: -0.6,
            warmth: 0.6,
            label: MoodLabel::Tired,
            genuine_moment: true,
        };
        let text = mood_style(&input);
        assert!(text.starts_with("[MOOD]\nYou're feeling tired (energy -0.60, warmth 0.60)."));
        assert!(text.contains("shared something real"));
    }
}
