//! Request texts sent to the language model.

use crate::recommendation::Recommendation;

/// Number of recommendations asked for when the caller has no preference.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// Ask for `count` artists similar to `artist`'s `album`, one `Name - Album` per line.
pub fn recommendation_prompt(artist: &str, album: &str, count: usize) -> String {
    format!(
        "Can you provide a list of {count} bands that are similar in musical style to {artist} \
         (specifically their album '{album}'), or that share band members, producers, \
         or other key collaborators with them? \
         Exclude any Rap or Hip-Hop artists. \
         For each band, please include a notable album or release. \
         Format your response as: Band Name - Album Name (one per line). \
         Nothing more in response, just the list of bands and albums."
    )
}

/// Ask for a short summary of what links the whole list to the source album.
pub fn general_explanation_prompt(
    artist: &str,
    album: &str,
    recommendations: &[Recommendation],
) -> String {
    let rec_list = recommendations
        .iter()
        .map(|r| format!("{} ({})", r.artist, r.album))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "I was listening to '{album}' by {artist} and got these music recommendations: {rec_list}. \
         Provide a brief 2-3 sentence explanation of the overall musical connections and themes that link \
         these recommendations to {artist}'s '{album}'. Focus on musical style, era, influences, \
         or collaborative connections."
    )
}

/// Ask why one particular album was recommended.
pub fn specific_explanation_prompt(
    artist: &str,
    album: &str,
    rec_artist: &str,
    rec_album: &str,
) -> String {
    format!(
        "Explain in 1-2 sentences why '{rec_album}' by {rec_artist} was recommended based on \
         '{album}' by {artist}. Focus on specific musical connections, shared members, \
         producers, similar sound, era, or influence relationships."
    )
}
