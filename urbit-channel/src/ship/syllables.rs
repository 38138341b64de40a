//! Syllable tables for ship names.
//!
//! Each table packs 256 three-letter syllables end to end. A syllable is
//! only meaningful at an offset that is a multiple of three; a match that
//! straddles two neighbours is not a syllable.

/// Prefix syllables, used for the leading half of every 6-character part.
pub(crate) const PREFIXES: &str = "\
dozmarbinwansamlitsighidfidlissogdirwacsabwissibrigsoldopmodfoglidhopdardorlorhodfolrintogsilmirholpaslacrovlivdalsatlibtabhanticpidtorbolfosdotlosdilforpilramtirwintadbicdifrocwidbisdasmidloprilnardapmolsanlocnovsitnidtipsicropwitnatpanminritpodmottamtolsavposnapnopsomfinfonbanmorworsipronnorbotwicsocwatdolmagpicdavbidbaltimtasmalligsivtagpadsaldivdactansidfabtarmonranniswolmispallasdismaprabtobrollatlonnodnavfignomnibpagsopralbilhaddocridmocpacravripfaltodtiltinhapmicfanpattaclabmogsimsonpinlomrictapfirhasbosbatpochactidhavsaplindibhosdabbitbarracparloddosbortochilmactomdigfilfasmithobharmighinradmashalraglagfadtopmophabnilnosmilfopfamdatnoldinhatnacrisfotribhocnimlarfitwalrapsarnalmoslandondanladdovrivbacpollaptalpitnambonrostonfodponsovnocsorlavmatmipfip";

/// Suffix syllables, used for the trailing half of every 6-character part
/// and for galaxy names.
pub(crate) const SUFFIXES: &str = "\
zodnecbudwessevpersutletfulpensytdurwepserwylsunrypsyxdyrnuphebpeglupdepdysputlughecryttyvsydnexlunmeplutseppesdelsulpedtemledtulmetwenbynhexfebpyldulhetmevruttylwydtepbesdexsefwycburderneppurrysrebdennutsubpetrulsynregtydsupsemwynrecmegnetsecmulnymtevwebsummutnyxrextebfushepbenmuswyxsymselrucdecwexsyrwetdylmynmesdetbetbeltuxtugmyrpelsyptermebsetdutdegtexsurfeltudnuxruxrenwytnubmedlytdusnebrumtynseglyxpunresredfunrevrefmectedrusbexlebduxrynnumpyxrygryxfeptyrtustyclegnemfermertenlusnussyltecmexpubrymtucfyllepdebbermughuttunbylsudpemdevlurdefbusbeprunmelpexdytbyttyplevmylwedducfurfexnulluclennerlexrupnedlecrydlydfenwelnydhusrelrudneshesfetdesretdunlernyrsebhulrylludremlysfynwerrycsugnysnyllyndyndemluxfedsedbecmunlyrtesmudnytbyrsenwegfyrmurtelreptegpecnelnevfes";

/// Index of `syllable` in `table`, counting only syllable-aligned offsets.
pub(crate) fn position(table: &str, syllable: &str) -> Option<usize> {
    if syllable.len() != 3 {
        return None;
    }
    table
        .as_bytes()
        .chunks_exact(3)
        .position(|chunk| chunk == syllable.as_bytes())
}

pub(crate) fn is_prefix(syllable: &str) -> bool {
    position(PREFIXES, syllable).is_some()
}

pub(crate) fn is_suffix(syllable: &str) -> bool {
    position(SUFFIXES, syllable).is_some()
}
