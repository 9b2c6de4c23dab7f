//! Built-in question bank used when neither the generator nor the store can
//! fill a session.

use crate::types::{Difficulty, Question, Theme};

struct Entry {
    text: &'static str,
    options: [&'static str; 4],
    correct: &'static str,
    difficulty: Difficulty,
}

const fn entry(
    text: &'static str,
    options: [&'static str; 4],
    correct: &'static str,
    difficulty: Difficulty,
) -> Entry {
    Entry {
        text,
        options,
        correct,
        difficulty,
    }
}

use Difficulty::{Easy, Hard, Medium};

const WORLD: &[Entry] = &[
    entry("Which country has won the most FIFA World Cups?", ["Germany", "Brazil", "Italy", "Argentina"], "Brazil", Easy),
    entry("Which player is nicknamed \"O Rei\"?", ["Garrincha", "Zico", "Pelé", "Ronaldo"], "Pelé", Easy),
    entry("Which club has won the most European Cup / Champions League titles?", ["AC Milan", "Bayern Munich", "Liverpool", "Real Madrid"], "Real Madrid", Easy),
    entry("How many players does each team field at kick-off?", ["10", "11", "9", "12"], "11", Easy),
    entry("Who won the 2022 FIFA World Cup?", ["France", "Croatia", "Argentina", "Morocco"], "Argentina", Easy),
    entry("Who scored the \"Hand of God\" goal in 1986?", ["Diego Maradona", "Michel Platini", "Zinedine Zidane", "Pelé"], "Diego Maradona", Easy),
    entry("Which country hosted the first FIFA World Cup in 1930?", ["Brazil", "Italy", "France", "Uruguay"], "Uruguay", Medium),
    entry("Who is the all-time top scorer at World Cup finals tournaments?", ["Ronaldo Nazário", "Miroslav Klose", "Gerd Müller", "Just Fontaine"], "Miroslav Klose", Medium),
    entry("In which year was FIFA founded?", ["1930", "1888", "1904", "1920"], "1904", Medium),
    entry("Which country won Euro 2004 as outsiders?", ["Portugal", "Czech Republic", "Netherlands", "Greece"], "Greece", Medium),
    entry("Which club won three consecutive European Cups from 1971 to 1973?", ["Ajax", "Feyenoord", "Barcelona", "PSV"], "Ajax", Medium),
    entry("What was the score of the 2014 World Cup semi-final between Brazil and Germany?", ["0-3", "1-7", "2-5", "1-4"], "1-7", Medium),
    entry("Who scored the winning goal in the 2010 World Cup final?", ["David Villa", "Xavi", "Fernando Torres", "Andrés Iniesta"], "Andrés Iniesta", Medium),
    entry("How many goals did Just Fontaine score at the 1958 World Cup?", ["11", "10", "13", "9"], "13", Hard),
    entry("Which nation won the first European Championship in 1960?", ["Soviet Union", "Spain", "Yugoslavia", "Italy"], "Soviet Union", Hard),
    entry("Which goalkeeper won the Ballon d'Or in 1963?", ["Gordon Banks", "Lev Yashin", "Dino Zoff", "Ricardo Zamora"], "Lev Yashin", Hard),
];

const AFRICAN: &[Entry] = &[
    entry("Which country has won the most Africa Cup of Nations titles?", ["Cameroon", "Ghana", "Egypt", "Nigeria"], "Egypt", Easy),
    entry("Which Liberian won the Ballon d'Or in 1995?", ["George Weah", "Samuel Eto'o", "Didier Drogba", "Abedi Pele"], "George Weah", Easy),
    entry("Which country hosted the first World Cup held in Africa, in 2010?", ["Egypt", "Morocco", "South Africa", "Nigeria"], "South Africa", Easy),
    entry("Which was the first African nation to reach a World Cup semi-final?", ["Cameroon", "Senegal", "Ghana", "Morocco"], "Morocco", Medium),
    entry("Which Cameroonian striker scored at the 1990 World Cup aged 38?", ["Samuel Eto'o", "Roger Milla", "François Omam-Biyik", "Patrick Mboma"], "Roger Milla", Medium),
    entry("What does the acronym CAF stand for?", ["Council of African Football", "Confédération Africaine de Football", "Central African Federation", "Confederation of African Federations"], "Confédération Africaine de Football", Hard),
];

const ANGOLAN: &[Entry] = &[
    entry("What is the nickname of the Angola national team?", ["Palancas Negras", "Leões Indomáveis", "Super Eagles", "Bafana Bafana"], "Palancas Negras", Easy),
    entry("What is the name of Angola's top football league?", ["Moçambola", "Girabola", "Liga Zon", "Primeira Liga"], "Girabola", Easy),
    entry("In which year did Angola play at its first FIFA World Cup?", ["2002", "1998", "2010", "2006"], "2006", Medium),
    entry("Which country hosted the 2010 Africa Cup of Nations?", ["Ghana", "Angola", "Egypt", "South Africa"], "Angola", Medium),
    entry("Who scored Angola's only goal at the 2006 World Cup?", ["Akwá", "Mantorras", "Flávio Amado", "Manucho"], "Flávio Amado", Hard),
    entry("Who captained Angola at the 2006 World Cup?", ["Fabrice Akwá", "Kali", "Figueiredo", "Zé Kalanga"], "Fabrice Akwá", Hard),
];

const CUPS: &[Entry] = &[
    entry("Which country won the 1998 World Cup on home soil?", ["Brazil", "Italy", "France", "Germany"], "France", Easy),
    entry("Which country co-hosted the 2002 World Cup with Japan?", ["China", "South Korea", "Thailand", "Australia"], "South Korea", Easy),
    entry("Which trophy was awarded to World Cup winners until 1970?", ["Henri Delaunay Trophy", "Coupe des Nations", "Jules Rimet Trophy", "FIFA Gold Cup"], "Jules Rimet Trophy", Medium),
    entry("Which team did Italy beat in the 2006 World Cup final?", ["Germany", "France", "Brazil", "Portugal"], "France", Medium),
    entry("Who won the Golden Ball at the 2014 World Cup?", ["James Rodríguez", "Thomas Müller", "Arjen Robben", "Lionel Messi"], "Lionel Messi", Hard),
];

/// Static fallback bank. Themes without their own entries borrow the default theme's.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinQuestions;

impl BuiltinQuestions {
    fn entries(theme: Theme) -> &'static [Entry] {
        match theme {
            Theme::World => WORLD,
            Theme::African => AFRICAN,
            Theme::Angolan => ANGOLAN,
            Theme::Cups => CUPS,
            Theme::European | Theme::Players | Theme::Clubs => &[],
        }
    }

    /// Questions for `theme`, or for the default theme when it has none
    pub fn for_theme(&self, theme: Theme) -> Vec<Question> {
        let (source_theme, entries) = match Self::entries(theme) {
            [] => (Theme::default(), Self::entries(Theme::default())),
            entries => (theme, entries),
        };
        let slug = serde_json::to_value(source_theme)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "default".to_string());

        entries
            .iter()
            .enumerate()
            .map(|(i, e)| Question {
                id: format!("builtin-{}-{:02}", slug, i + 1),
                text: e.text.to_string(),
                options: e.options.iter().map(|o| o.to_string()).collect(),
                correct_answer: e.correct.to_string(),
                theme: source_theme,
                subtheme: "Classics".to_string(),
                difficulty: e.difficulty,
                approved: true,
                suggested_by: None,
                created_at: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_question_is_valid() {
        for theme in Theme::ALL {
            for q in BuiltinQuestions.for_theme(theme) {
                assert_eq!(q.validate(), Ok(()), "invalid builtin question {}", q.id);
                assert!(q.approved);
            }
        }
    }

    #[test]
    fn test_world_bank_fills_a_session() {
        assert!(BuiltinQuestions.for_theme(Theme::World).len() >= 15);
    }

    #[test]
    fn test_theme_without_bank_falls_back_to_default() {
        let questions = BuiltinQuestions.for_theme(Theme::Clubs);
        assert!(!questions.is_empty());
        assert!(questions.iter().all(|q| q.theme == Theme::World));
        assert!(questions[0].id.starts_with("builtin-world-"));
    }

    #[test]
    fn test_ids_are_unique_per_theme() {
        let questions = BuiltinQuestions.for_theme(Theme::Angolan);
        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), questions.len());
        assert!(questions.iter().all(|q| q.theme == Theme::Angolan));
    }
}
