// Onbid data models

use serde::{Deserialize, Serialize};

/// True for values the feed uses as image links
pub fn is_image_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

macro_rules! auction_item {
    ($($field:ident => $tag:literal),+ $(,)?) => {
        /// One flattened auction listing
        ///
        /// Every descriptive field is optional. `None` means the tag was
        /// missing or blank; a parsed record never holds `Some("")`.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct AuctionItem {
            $(pub $field: Option<String>,)+
            /// Image URLs in document order; `None` when no link qualified
            pub image_files: Option<Vec<String>>,
        }

        impl AuctionItem {
            /// Upstream tag names, in column order
            pub const TAGS: &'static [&'static str] = &[$($tag),+];

            /// Table column names, in the same order as [`AuctionItem::TAGS`]
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Field carried by an upstream tag
            pub fn field_mut(&mut self, tag: &str) -> Option<&mut Option<String>> {
                match tag {
                    $($tag => Some(&mut self.$field),)+
                    _ => None,
                }
            }

            /// Descriptive field values in column order
            pub fn text_values(&self) -> Vec<Option<&str>> {
                vec![$(self.$field.as_deref()),+]
            }
        }
    };
}

auction_item! {
    rnum => "RNUM",
    plnm_no => "PLNM_NO",
    pbct_no => "PBCT_NO",
    pbct_cdtn_no => "PBCT_CDTN_NO",
    cltr_no => "CLTR_NO",
    cltr_hstr_no => "CLTR_HSTR_NO",
    scrn_grp_cd => "SCRN_GRP_CD",
    ctgr_full_nm => "CTGR_FULL_NM",
    bid_mnmt_no => "BID_MNMT_NO",
    cltr_nm => "CLTR_NM",
    cltr_mnmt_no => "CLTR_MNMT_NO",
    ldnm_adrs => "LDNM_ADRS",
    nmrd_adrs => "NMRD_ADRS",
    ldnm_pnu => "LDNM_PNU",
    dpsl_mtd_cd => "DPSL_MTD_CD",
    dpsl_mtd_nm => "DPSL_MTD_NM",
    bid_mtd_nm => "BID_MTD_NM",
    min_bid_prc => "MIN_BID_PRC",
    apsl_ases_avg_amt => "APSL_ASES_AVG_AMT",
    fee_rate => "FEE_RATE",
    pbct_begn_dtm => "PBCT_BEGN_DTM",
    pbct_cls_dtm => "PBCT_CLS_DTM",
    pbct_cltr_stat_nm => "PBCT_CLTR_STAT_NM",
    uscbd_cnt => "USCBD_CNT",
    iqry_cnt => "IQRY_CNT",
    goods_nm => "GOODS_NM",
    manf => "MANF",
    mdl => "MDL",
    nrgt => "NRGT",
    grbx => "GRBX",
    endpc => "ENDPC",
    vhcl_mlge => "VHCL_MLGE",
    fuel => "FUEL",
    scrt_nm => "SCRT_NM",
    tpbz => "TPBZ",
    itm_nm => "ITM_NM",
    mmb_rgt_nm => "MMB_RGT_NM",
}

impl AuctionItem {
    /// Persisted form of `image_files`: comma-joined, NULL when absent
    pub fn image_files_column(&self) -> Option<String> {
        self.image_files.as_ref().map(|urls| urls.join(","))
    }
}

/// Structured image link produced by the normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLink {
    /// 1-based position among the qualifying links, as decimal text
    pub seq: String,
    pub url: String,
}

impl From<ImageLink> for serde_json::Value {
    fn from(link: ImageLink) -> Self {
        serde_json::json!({ "seq": link.seq, "url": link.url })
    }
}

/// Interactive list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnbidListPage {
    pub total_count: i64,
    pub items: Vec<serde_json::Value>,
}
