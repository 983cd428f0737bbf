/// Accounts known to vote automatically (bid bots, trails, self-voting rings).
/// Their votes are ignored when estimating rank consensus.
pub const AUTOMATED_VOTERS: &[&str] = &[
    "animus",
    "appreciator",
    "arama",
    "ausbitbot",
    "bago",
    "bambam808",
    "banjo",
    "barrie",
    "bellyrub",
    "besttocome215",
    "bierkaart",
    "biskopakon",
    "blackwidow7",
    "blimbossem",
    "boomerang",
    "booster",
    "boostupvote",
    "bowlofbitcoin",
    "bp423",
    "brandybb",
    "brensker",
    "btcvenom",
    "buildawhale",
    "burdok213",
    "businessbot",
    "centerlink",
    "cleverbot",
    "cnbuddy",
    "counterbot",
    "crypto-hangouts",
    "cryptobooty",
    "cryptoholic",
    "cryptoowl",
    "cub1",
    "curationrus",
    "dahrma",
    "davidding",
    "decibel",
    "deutschbot",
    "dirty.hera",
    "discordia",
    "done",
    "drakkald",
    "drotto",
    "earthboundgiygas",
    "edrivegom",
    "emilhoch",
    "eoscrusher",
    "famunger",
    "feedyourminnows",
    "followforupvotes",
    "frontrunner",
    "fuzzyvest",
    "gamerpool",
    "gamerveda",
    "gaming-hangouts",
    "gindor",
    "givemedatsteem",
    "givemesteem1",
    "glitterbooster",
    "gonewhaling",
    "gotvotes",
    "gpgiveaways",
    "gsgaming",
    "guarddog",
    "heelpopulair",
    "helpfulcrypto",
    "idioticbot",
    "ikwindje",
    "ilvacca",
    "inchonbitcoin",
    "ipuffyou",
    "lovejuice",
    "mahabrahma",
    "make-a-whale",
    "makindatsteem",
    "maradaratar",
    "minnowbooster",
    "minnowhelper",
    "minnowpond",
    "minnowpondblue",
    "minnowpondred",
    "misterwister",
    "moonbot",
    "morwhale",
    "moses153",
    "moyeses",
    "msp-lovebot",
    "msp-shanehug",
    "msp-venezuela",
    "msp-music",
    "msp-mods",
    "msp-africa",
    "msp-canada",
    "muxxybot",
    "myday",
    "ninja-whale",
    "ninjawhale",
    "officialfuzzy",
    "perennial",
    "pimpoesala",
    "polsza",
    "portoriko",
    "prambarbara",
    "proctologic",
    "pumpingbitcoin",
    "pushup",
    "qurator",
    "qwasert",
    "raidrunner",
    "ramta",
    "randovote",
    "randowhale",
    "randowhale0",
    "randowhale1",
    "randowhaletrail",
    "randowhaling",
    "reblogger",
    "resteem.bot",
    "resteemable",
    "resteembot",
    "russiann",
    "scamnotifier",
    "scharmebran",
    "siliwilly",
    "sneaky-ninja",
    "sniffo35",
    "soonmusic",
    "spinbot",
    "stackin",
    "steemedia",
    "steemholder",
    "steemit-gamble",
    "steemit-hangouts",
    "steemitgottalent",
    "steemmaker",
    "steemmemes",
    "steemminers",
    "steemode",
    "steemprentice",
    "steemsquad",
    "steemthat",
    "steemvoter",
    "stephen.king989",
    "tabea",
    "tarmaland",
    "timbalabuch",
    "trail1",
    "trail2",
    "trail3",
    "trail4",
    "trail5",
    "trail6",
    "trail7",
    "viraltrend",
    "votey",
    "waardanook",
    "wahyurahadiann",
    "wannabeme",
    "weareone1",
    "whatamidoing",
    "whatupgg",
    "wildoekwind",
    "wiseguyhuh",
    "wistoepon",
    "zdashmash",
    "zdemonz",
    "zhusatriani",
];

/// Merge the built-in denylist with extra entries (one account per line, `#` comments).
pub fn denylist_with_extras(extra: &str) -> Vec<String> {
    let mut list: Vec<String> = AUTOMATED_VOTERS.iter().map(|s| s.to_string()).collect();
    for line in extra.lines() {
        let name = line.split('#').next().unwrap_or_default().trim();
        if !name.is_empty() && !list.iter().any(|n| n == name) {
            list.push(name.to_string());
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_are_appended_once() {
        let list = denylist_with_extras("newbot\n# comment\nanimus\n  other  # trailing\n");
        assert_eq!(list.len(), AUTOMATED_VOTERS.len() + 2);
        assert!(list.iter().any(|n| n == "newbot"));
        assert!(list.iter().any(|n| n == "other"));
    }
}
