//! Text rendering for chat responses

use std::fmt::Write as _;

use kbchat_store::{KnowledgeEntry, SearchHit, StoreStats};

/// Characters of content shown per entry in listings
pub const PREVIEW_CHARS: usize = 100;

/// Content preview: the first 100 characters, with `...` when truncated
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

pub fn list(kb_name: &str, category: Option<&str>, entries: &[KnowledgeEntry]) -> String {
    let mut lines = vec![match category {
        Some(category) => format!("📋 {kb_name} Knowledge Base (Category: {category}):\n"),
        None => format!("📋 {kb_name} Knowledge Base:\n"),
    }];

    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{}. **{}** ({})", i + 1, entry.title, entry.category));
        lines.push(format!("   {}\n", preview(&entry.content)));
    }

    lines.join("\n")
}

pub fn list_empty(category: Option<&str>) -> String {
    match category {
        Some(category) => format!("📋 No items found in category '{category}'."),
        None => "📋 No items found.".to_string(),
    }
}

pub fn stats(kb_name: &str, stats: &StoreStats) -> String {
    format!(
        "📊 **{kb_name} Database Statistics**\n\n\
         📚 Total Entries: {}\n\
         🏗️ Schema Classes: {}\n\
         🕒 Last Updated: {}\n\n\
         Use 'list all' to see all entries or 'list category_name' to filter by category.",
        stats.total_entries, stats.schema_classes, stats.timestamp
    )
}

pub fn help(kb_name: &str) -> String {
    format!(
        "🤖 **{kb_name} Knowledge Base Commands:**

**Search & Query:**
• Just type your question naturally to search the knowledge base

**Database Management:**
• `add: title | content | category` - Add new knowledge
• `delete: search term` - Delete matching entry
• `update: search term | new content` - Update existing entry
• `list` or `list all` - Show all entries
• `list category_name` - Show entries in specific category
• `stats` - Show database statistics
• `clear` - Clear cached search results
• `help` - Show this help message

**Examples:**
• `add: HDMI 2.1 | Latest HDMI standard with 48Gbps bandwidth | technology`
• `delete: HDMI 2.1`
• `update: HDMI 2.1 | HDMI 2.1 supports 8K video and enhanced gaming features`
• `list technology`

**Categories:**
• technology, urban-planning, connectivity, infrastructure, smart-city"
    )
}

pub fn search_results(kb_name: &str, query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!(
            "🔍 I couldn't find any information about '{query}' in the {kb_name} knowledge base.\n\n\
             Try:\n\
             • Using different keywords\n\
             • Adding information with: `add: title | content | category`\n\
             • Type 'help' for more commands"
        );
    }

    let mut out = format!(
        "🔍 **Found {} result(s) for '{query}' in {kb_name}:**\n",
        hits.len()
    );
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "\n**{}. {}** ({}) - {:.2} match\n{}\n",
            i + 1,
            hit.entry.title,
            hit.entry.category,
            hit.certainty,
            hit.entry.content
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbchat_store::NewEntry;

    fn entry(title: &str, content: &str, category: &str) -> KnowledgeEntry {
        NewEntry::new(title, content)
            .with_category(category)
            .into_entry("id", chrono::Utc::now())
    }

    #[test]
    fn preview_keeps_short_content() {
        let exact = "x".repeat(100);
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&exact), exact);
    }

    #[test]
    fn preview_truncates_long_content() {
        let long = "y".repeat(101);
        assert_eq!(preview(&long), format!("{}...", "y".repeat(100)));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let long = "é".repeat(150);
        assert_eq!(preview(&long).chars().count(), 103);
    }

    #[test]
    fn list_numbers_entries_from_one() {
        let entries = vec![
            entry("HDMI 2.1", "48Gbps", "technology"),
            entry("Signage", "Displays", "infrastructure"),
        ];
        let text = list("HDMI City Dwellers", Some("technology"), &entries);

        assert!(text.starts_with("📋 HDMI City Dwellers Knowledge Base (Category: technology):"));
        assert!(text.contains("1. **HDMI 2.1** (technology)"));
        assert!(text.contains("2. **Signage** (infrastructure)"));
        assert!(text.contains("   48Gbps"));
    }

    #[test]
    fn stats_mentions_counts_and_timestamp() {
        let snapshot = StoreStats {
            total_entries: 5,
            schema_classes: 1,
            timestamp: "2024-01-01T00:00:00".to_string(),
        };
        let text = stats("KB", &snapshot);
        assert!(text.contains("Total Entries: 5"));
        assert!(text.contains("Schema Classes: 1"));
        assert!(text.contains("2024-01-01T00:00:00"));
    }

    #[test]
    fn search_results_format_scores_with_two_decimals() {
        let hits = vec![SearchHit::new(entry("HDMI 2.1", "48Gbps", "technology"), 0.912)];
        let text = search_results("KB", "hdmi", &hits);

        assert!(text.contains("Found 1 result(s) for 'hdmi'"));
        assert!(text.contains("**1. HDMI 2.1** (technology) - 0.91 match"));
        assert!(text.contains("48Gbps"));
    }

    #[test]
    fn empty_search_suggests_next_steps() {
        let text = search_results("KB", "what is hdmi", &[]);
        assert!(text.contains("couldn't find any information about 'what is hdmi'"));
        assert!(text.contains("help"));
    }
}
