//! A partial Windows LCID → BCP-47 table (§4.D, SPEC_FULL.md §4
//! supplemented feature). Scoped to the LCIDs that actually turn up in
//! `ProductLanguage` values in practice; anything else is dropped
//! silently, matching the spec's stated behavior for unresolved codes.

/// Resolve a decimal `ProductLanguage` LCID to a BCP-47 tag.
pub fn lcid_to_bcp47(lcid: u32) -> Option<&'static str> {
    let tag = match lcid {
        1033 => "en-US",
        2057 => "en-GB",
        3081 => "en-AU",
        4105 => "en-CA",
        1036 => "fr-FR",
        3084 => "fr-CA",
        1031 => "de-DE",
        1034 => "es-ES",
        3082 => "es-ES",
        1040 => "it-IT",
        1041 => "ja-JP",
        2052 => "zh-CN",
        1028 => "zh-TW",
        1046 => "pt-BR",
        2070 => "pt-PT",
        1043 => "nl-NL",
        1053 => "sv-SE",
        1030 => "da-DK",
        1044 => "nb-NO",
        1035 => "fi-FI",
        1045 => "pl-PL",
        1049 => "ru-RU",
        1042 => "ko-KR",
        1029 => "cs-CZ",
        1038 => "hu-HU",
        1032 => "el-GR",
        1055 => "tr-TR",
        1025 => "ar-SA",
        1037 => "he-IL",
        1054 => "th-TH",
        1066 => "vi-VN",
        1057 => "id-ID",
        1086 => "ms-MY",
        1026 => "bg-BG",
        1048 => "ro-RO",
        1051 => "sk-SK",
        1060 => "sl-SI",
        1050 => "hr-HR",
        1061 => "et-EE",
        1062 => "lv-LV",
        1063 => "lt-LT",
        1058 => "uk-UA",
        _ => return None,
    };
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_lcid() {
        assert_eq!(lcid_to_bcp47(1033), Some("en-US"));
    }

    #[test]
    fn unknown_lcid_drops_silently() {
        assert_eq!(lcid_to_bcp47(999_999), None);
    }
}
