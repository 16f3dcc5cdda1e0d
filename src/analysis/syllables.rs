use crate::config::SyllableCounter;

const SIMPLE_VOWELS: &str = "aeiou";
const EXTENDED_VOWELS: &str = "aeiouyąęó";
const TRIPHTHONGS: [&str; 3] = ["eau", "iou", "uoi"];
const DIPHTHONGS: [&str; 21] = [
    "ae", "ai", "ao", "au", "ea", "ei", "eo", "eu", "ia", "ie", "io", "iu", "oa", "oe", "oi", "oo",
    "ou", "ua", "ue", "ui", "uo",
];

/// Estimated syllable count of a written word, never less than one.
pub fn count_syllables(word: &str, counter: SyllableCounter) -> usize {
    let count = match counter {
        SyllableCounter::VowelLetters => word
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| SIMPLE_VOWELS.contains(*c))
            .count(),
        SyllableCounter::DiphthongAware => count_vowel_groups(word),
    };
    count.max(1)
}

fn count_vowel_groups(word: &str) -> usize {
    let letters: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    let mut count = 0;
    let mut i = 0;
    while i < letters.len() {
        if EXTENDED_VOWELS.contains(letters[i]) {
            count += 1;
            i += group_len_at(&letters[i..]);
        } else {
            i += 1;
        }
    }
    count
}

fn group_len_at(rest: &[char]) -> usize {
    let starts_with = |group: &str| {
        let group: Vec<char> = group.chars().collect();
        rest.len() >= group.len() && rest[..group.len()] == group[..]
    };
    if TRIPHTHONGS.iter().any(|g| starts_with(g)) {
        3
    } else if DIPHTHONGS.iter().any(|g| starts_with(g)) {
        2
    } else {
        1
    }
}
