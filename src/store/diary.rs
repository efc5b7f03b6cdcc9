use jiff::civil::Date;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    sea_query::{Expr, Func, SimpleExpr},
};

use super::{Store, new_id};
use crate::{
    dates::{self, now_sec},
    entities::{diary_entry, title},
    error::AppResult,
    models::{DiaryEntryView, DiaryStats},
};

#[derive(Clone, Debug)]
pub struct NewDiaryEntry {
    pub title_id: String,
    pub watched_on: Date,
    pub rating: Option<f64>,
    pub liked: bool,
    pub rewatch: bool,
    pub notes: Option<String>,
}

impl Store {
    pub async fn log_diary_entry(&self, new: NewDiaryEntry) -> AppResult<diary_entry::Model> {
        let entry = diary_entry::Model {
            id: new_id(),
            title_id: new.title_id,
            watched_on: new.watched_on.to_string(),
            rating: new.rating,
            liked: new.liked,
            rewatch: new.rewatch,
            notes: super::clean_text(new.notes.as_deref()),
            created_at: now_sec(),
        };
        diary_entry::Entity::insert(diary_entry::ActiveModel {
            id: Set(entry.id.clone()),
            title_id: Set(entry.title_id.clone()),
            watched_on: Set(entry.watched_on.clone()),
            rating: Set(entry.rating),
            liked: Set(entry.liked),
            rewatch: Set(entry.rewatch),
            notes: Set(entry.notes.clone()),
            created_at: Set(entry.created_at),
        })
        .exec_without_returning(&self.db)
        .await?;

        tracing::debug!(entry_id = %entry.id, watched_on = %entry.watched_on, "logged diary entry");
        Ok(entry)
    }

    pub async fn diary_entry_exists(&self, title_id: &str, watched_on: Date) -> AppResult<bool> {
        let count = diary_entry::Entity::find()
            .filter(diary_entry::Column::TitleId.eq(title_id))
            .filter(diary_entry::Column::WatchedOn.eq(watched_on.to_string()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Newest `watched_on` first, optionally restricted to a half-open date range.
    pub async fn recent_diary_entries(
        &self,
        limit: u64,
        range: Option<(Date, Date)>,
    ) -> AppResult<Vec<DiaryEntryView>> {
        let rows = within(diary_entry::Entity::find(), range)
            .find_also_related(title::Entity)
            .order_by_desc(diary_entry::Column::WatchedOn)
            .order_by_desc(diary_entry::Column::CreatedAt)
            .order_by_desc(super::insertion_order(diary_entry::Entity))
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(entry, title)| DiaryEntryView::new(entry, title.as_ref()))
            .collect())
    }

    /// `year_count` needs `year`; `month_count` needs both. The average covers rated entries only.
    pub async fn diary_stats(&self, year: Option<i16>, month: Option<i8>) -> AppResult<DiaryStats> {
        let year_range = year.and_then(dates::year_range);
        let month_range = year.zip(month).and_then(|(y, m)| dates::month_range(y, m));

        let (total, year_count, month_count, avg_rating) = futures::try_join!(
            diary_entry::Entity::find().count(&self.db),
            self.count_within(year_range),
            self.count_within(month_range),
            self.average_rating(),
        )?;

        Ok(DiaryStats {
            total,
            year_count,
            month_count,
            avg_rating: avg_rating.unwrap_or(0.0),
        })
    }

    async fn count_within(&self, range: Option<(Date, Date)>) -> Result<u64, sea_orm::DbErr> {
        if range.is_none() {
            return Ok(0);
        }
        within(diary_entry::Entity::find(), range).count(&self.db).await
    }

    async fn average_rating(&self) -> Result<Option<f64>, sea_orm::DbErr> {
        let avg = diary_entry::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(diary_entry::Column::Rating))),
                "avg_rating",
            )
            .into_tuple::<Option<f64>>()
            .one(&self.db)
            .await?;
        Ok(avg.flatten())
    }
}

fn within(select: Select<diary_entry::Entity>, range: Option<(Date, Date)>) -> Select<diary_entry::Entity> {
    match range {
        Some((start, end)) => select
            .filter(diary_entry::Column::WatchedOn.gte(start.to_string()))
            .filter(diary_entry::Column::WatchedOn.lt(end.to_string())),
        None => select,
    }
}
