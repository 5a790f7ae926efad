//! Prompt templates for every generation stage.
//!
//! Each template opens with a fixed role line so a transcript (or a test
//! double) can tell the stages apart.

use brandcast_shared::Channel;

pub(crate) const RESEARCH_PREAMBLE: &str = "You are an expert research analyst.";
pub(crate) const STRATEGY_PREAMBLE: &str = "You are an expert content strategist.";
pub(crate) const EVALUATOR_PREAMBLE: &str = "You are a content quality evaluator.";
pub(crate) const ANALYST_PREAMBLE: &str = "You are an expert content analyst.";

/// Inputs shared by the research and strategy prompts.
pub(crate) struct BriefContext<'a> {
    pub brand_info: &'a str,
    pub topic: &'a str,
    pub target_audience: &'a str,
}

pub(crate) fn research_synthesis(ctx: &BriefContext<'_>, sources: &str) -> String {
    format!(
        "{RESEARCH_PREAMBLE} Turn the search results below into a research report \
that content writers can build on.

CONTEXT:
Brand: {brand}
Topic: {topic}
Target Audience: {audience}

SEARCH RESULTS:
{sources}

Structure the report as:
1. Key Insights: five to seven central findings
2. Recent Statistics: figures worth quoting, with their sources
3. Trending Angles: what is being discussed right now
4. Audience Pain Points: the questions and problems this audience has
5. Content Opportunities: gaps and fresh angles
6. Key Quotes and Facts: short, quotable statements
7. Competitor Insights: how others cover this topic

Be concrete, cite sources where you can, and favour actionable insight over summary.",
        brand = ctx.brand_info,
        topic = ctx.topic,
        audience = ctx.target_audience,
    )
}

pub(crate) fn strategy(ctx: &BriefContext<'_>, brand_tone: &str, research: &str) -> String {
    format!(
        "{STRATEGY_PREAMBLE} Using the research report, plan a campaign that will run \
on Twitter, LinkedIn, Instagram and an email newsletter.

CONTEXT:
Brand: {brand}
Topic: {topic}
Target Audience: {audience}
Brand Tone: {brand_tone}

RESEARCH REPORT:
{research}

Cover each of the following:

1. CORE MESSAGE: the one idea the audience must take away, and why it matters to them.
2. NARRATIVE ANGLE: the storytelling approach and how it positions the brand as a trusted voice.
3. KEY STATISTICS: the two or three strongest data points and what they mean for the audience.
4. CHANNEL HOOKS:
   Twitter Hook: an opening line for a thread
   LinkedIn Hook: a thought-leadership opener
   Instagram Hook: a relatable, visual opener
   Newsletter Hook: a subject line and first paragraph approach
5. CALL TO ACTION: what readers should do next, phrased per channel.
6. CONTENT STRUCTURE: how the piece flows from opening to close and the emotions to evoke.
7. KEYWORDS AND HASHTAGS: five to seven keywords plus hashtags per channel.
8. DIFFERENTIATION: the angle competitors are missing.

Be specific. Writers will follow this plan directly.",
        brand = ctx.brand_info,
        topic = ctx.topic,
        audience = ctx.target_audience,
    )
}

/// Inputs for one channel draft.
pub(crate) struct DraftContext<'a> {
    pub research: &'a str,
    pub strategy: &'a str,
    pub brand_info: &'a str,
    pub topic: &'a str,
    pub brand_tone: &'a str,
    /// Evaluator feedback from the previous pass; empty on the first pass.
    pub feedback: &'a str,
}

pub(crate) fn channel_draft(channel: Channel, ctx: &DraftContext<'_>) -> String {
    let (role, brief) = channel_brief(channel);

    let revision = if ctx.feedback.trim().is_empty() {
        String::new()
    } else {
        format!(
            "\nREVISION NOTES:\nA reviewer scored the previous draft below the bar. \
Address this feedback in the new version:\n{}\n",
            ctx.feedback.trim()
        )
    };

    format!(
        "{role}

CHANNEL: {channel}
BRAND: {brand}
TOPIC: {topic}
TONE: {tone}

RESEARCH INSIGHTS:
{research}

CONTENT STRATEGY:
{strategy}
{revision}
{brief}

Write the complete piece now.",
        channel = channel.display_name(),
        brand = ctx.brand_info,
        topic = ctx.topic,
        tone = ctx.brand_tone,
        research = ctx.research,
        strategy = ctx.strategy,
    )
}

fn channel_brief(channel: Channel) -> (&'static str, &'static str) {
    match channel {
        Channel::Twitter => (
            "You write Twitter threads that stop the scroll.",
            "Write a thread of 10 to 12 tweets that:
- opens with the Twitter hook from the strategy
- weaves in the key statistics
- keeps every tweet under 280 characters
- numbers each tweet (1/12, 2/12, ...)
- uses at most two emojis per tweet
- closes with the call to action from the strategy",
        ),
        Channel::LinkedIn => (
            "You write thought-leadership posts for LinkedIn.",
            "Write a LinkedIn post that:
- opens with the LinkedIn hook; the first two lines must earn the click
- runs 200 to 300 words
- puts the key statistics in context
- uses short paragraphs and line breaks
- ends with the call to action phrased as a discussion question
- carries four or five hashtags from the strategy",
        ),
        Channel::Instagram => (
            "You write Instagram captions people want to share.",
            "Write an Instagram caption that:
- opens with the Instagram hook, which shows in the feed preview
- runs 150 to 200 words
- includes one or two key statistics
- uses three to five emojis and line breaks for rhythm
- includes the call to action and invites comments
- ends with 10 to 15 hashtags mixing broad and niche tags",
        ),
        Channel::Newsletter => (
            "You write email newsletters that get opened and read.",
            "Write an email newsletter with:
SUBJECT LINE: three options built on the newsletter hook
PREVIEW TEXT: one short teaser
EMAIL BODY:
- an opening paragraph with the hook
- three or four short sections with subheadings
- the key statistics, each with context
- 400 to 600 words of scannable text
- clear call-to-action button text
- a P.S. with a secondary call to action",
        ),
    }
}

pub(crate) fn evaluation(
    channel: Channel,
    content: &str,
    strategy: &str,
    brand_tone: &str,
) -> String {
    format!(
        "{EVALUATOR_PREAMBLE} Score the draft below.

PLATFORM: {platform}
BRAND TONE: {brand_tone}

STRATEGY GUIDELINES:
{strategy}

GENERATED CONTENT:
{content}

Rate each criterion from 1 to 10:
1. Brand Alignment: does it sound like the brand?
2. Strategy Adherence: does it follow the strategy?
3. Engagement Potential: will it earn attention and interaction?
4. Clarity: is the message easy to follow?
5. Call-to-Action: is the next step clear and compelling?
6. Platform Optimization: does it fit {platform}'s format and norms?

Reply in exactly this layout:

SCORES:
Brand Alignment: [score]/10
Strategy Adherence: [score]/10
Engagement Potential: [score]/10
Clarity: [score]/10
Call-to-Action: [score]/10
Platform Optimization: [score]/10

OVERALL SCORE: [average]/10

FEEDBACK:
[what works and what to change]

RECOMMENDATION: [APPROVE or REVISE]",
        platform = channel.display_name(),
    )
}

pub(crate) fn content_analysis(content: &str) -> String {
    format!(
        "{ANALYST_PREAMBLE} Analyze the content below and extract:

1. Main Topic: the core subject
2. Key Points: five to seven main takeaways, as bullet points
3. Tone: the writing style (professional, casual, inspirational, ...)
4. Target Audience: who the piece is written for
5. Call-to-Action: what readers should do next
6. Hook Elements: the parts that would grab attention on social media

CONTENT:
{content}

Give the analysis in that structure."
    )
}

/// Prompt for adapting an analyzed source piece to one channel.
pub(crate) fn repurpose(channel: Channel, analysis: &str, original: &str) -> String {
    let (role, rules) = repurpose_brief(channel);

    format!(
        "{role} Adapt the source content below for {channel}.

CHANNEL: {channel}

CONTENT ANALYSIS:
{analysis}

ORIGINAL CONTENT:
{original}

{rules}

Keep the author's voice. Write the complete piece now.",
        channel = channel.display_name(),
    )
}

fn repurpose_brief(channel: Channel) -> (&'static str, &'static str) {
    match channel {
        Channel::Twitter => (
            "You turn long-form writing into Twitter threads.",
            "THREAD RULES:
- 8 to 12 tweets, numbered (1/12, 2/12, ...)
- tweet 1 is a hook: a question, a bold claim or a striking figure
- one key point per tweet, in short sentences with line breaks
- one or two emojis per tweet at most
- every tweet under 280 characters
- the last tweet is the call to action",
        ),
        Channel::LinkedIn => (
            "You turn long-form writing into LinkedIn posts.",
            "POST RULES:
- the first two lines are the hook
- 150 to 300 words, professional but conversational
- short paragraphs, no walls of text
- focus on insights and actionable takeaways
- one or two emojis at most
- close with a question that invites comments, then three to five hashtags",
        ),
        Channel::Instagram => (
            "You turn long-form writing into Instagram captions.",
            "CAPTION RULES:
- the first line must work as the feed preview
- 125 to 150 words, friendly and authentic
- three to five emojis and line breaks for rhythm
- a call to action to save, share or comment
- end with 10 to 15 hashtags mixing broad and niche tags",
        ),
        Channel::Newsletter => (
            "You turn long-form writing into email newsletters.",
            "NEWSLETTER RULES:
- SUBJECT LINE: three options
- PREVIEW TEXT: one short teaser
- an opening paragraph built on the strongest hook
- two or three short sections with subheadings covering the key points
- 300 to 500 words of scannable text
- clear call-to-action button text",
        ),
    }
}
